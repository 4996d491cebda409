use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn probe_multi() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Seed one row so the conflict SELECT returns something.
    db.query("CREATE type::record('reservation', 'a') SET room_id = 'r', status = 'Pending'")
        .await.unwrap().check().unwrap();

    let q = "BEGIN TRANSACTION; \
         LET $conflicts = (SELECT meta::id(id) AS record_id FROM reservation WHERE room_id = 'r'); \
         IF array::len($conflicts) > 0 { THROW 'guard:room_not_available'; }; \
         CREATE type::record('reservation', 'b') SET room_id = 'r', status = 'Pending'; \
         COMMIT TRANSACTION;";
    let resp = db.query(q).await;
    match resp {
        Err(e) => eprintln!("PROBE_TOPLEVEL_ERR=[{}]", e),
        Ok(mut r) => {
            let errs = r.take_errors();
            eprintln!("PROBE_NUM_ERRS={}", errs.len());
            for (idx, e) in errs.iter() {
                eprintln!("PROBE_STMT[{}]=[{}]", idx, e);
            }
        }
    }
}
