use citydata_service::config::IngestConfig;
use citydata_service::db::{self, REQUIRED_TABLES};

fn main() {
    let config = IngestConfig::load().expect("SEOUL_API_KEY and database settings must be set");

    println!("Connecting (pool size {})...", config.pool_size);

    let pool = db::connect_pool(&config).expect("Failed to connect");

    println!("✓ Connected successfully");

    // Test 1: Required tables
    for &table in REQUIRED_TABLES {
        match db::verify_tables(&pool, &[table]) {
            Ok(()) => println!("✓ {} exists", table),
            Err(e) => println!("✗ {}", e),
        }
    }

    // Test 2: Registry contents
    let mut conn = pool.get().expect("Failed to check out connection");
    match conn.query("SELECT DISTINCT area_nm FROM area ORDER BY area_nm", &[]) {
        Ok(rows) => {
            println!("✓ {} areas registered:", rows.len());
            for row in rows.iter().take(10) {
                let name: String = row.get(0);
                println!("  - {}", name);
            }
        }
        Err(e) => println!("✗ Error reading area table: {}", e),
    }

    // Test 3: Freshest live snapshot
    match conn.query_opt(
        "SELECT area_cd, ppltn_time::text FROM area_data_live ORDER BY ppltn_time DESC LIMIT 1",
        &[],
    ) {
        Ok(Some(row)) => {
            let area: String = row.get(0);
            let time: String = row.get(1);
            println!("✓ Latest snapshot: {} at {}", area, time);
        }
        Ok(None) => println!("✓ area_data_live is empty"),
        Err(e) => println!("✗ Error reading area_data_live: {}", e),
    }
}
