//! SurrealDB repository implementations.

mod audit;
mod charge;
mod daily_close;
mod guest;
mod payment;
mod reservation;
mod room;
mod room_type;
mod tenant;

pub use audit::SurrealAuditLogRepository;
pub use charge::SurrealChargeRepository;
pub use daily_close::SurrealDailyCloseRepository;
pub use guest::SurrealGuestRepository;
pub use payment::SurrealPaymentRepository;
pub use reservation::SurrealReservationRepository;
pub use room::SurrealRoomRepository;
pub use room_type::SurrealRoomTypeRepository;
pub use tenant::SurrealTenantRepository;
