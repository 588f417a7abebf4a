/// Example: Decode a saved city data response
///
/// Usage:
///   cargo run --example parse_citydata -- <xml_file>
///
/// A response can be saved with:
///   curl -o gwanghwamun.xml "http://openapi.seoul.go.kr:8088/$SEOUL_API_KEY/xml/citydata/1/5/POI009"
///
/// Shows:
///   - Live congestion and population range
///   - Commercial activity, when published
///   - Forecast slots and industry segments

use chrono::Utc;
use citydata_service::ingest::citydata::parse_citydata;
use std::env;
use std::fs;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <xml_file>", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let payload = fs::read(filename).expect("Failed to read XML file");

    println!("Decoding city data response from: {}\n", filename);

    let batch = match parse_citydata(&payload, Utc::now()) {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            println!("No data published for this area (nothing would be stored).");
            return;
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let live = &batch.live;
    println!("Area {} observed at {}", live.area_code, live.observed_at);
    println!(
        "  Congestion: {} ({})",
        live.congestion_level.as_deref().unwrap_or("-"),
        live.congestion_message.as_deref().unwrap_or("")
    );
    println!(
        "  Population: {:?} – {:?}",
        live.population_min, live.population_max
    );
    match &live.commercial_level {
        Some(level) => println!(
            "  Commerce:   {} ({:?} payments, {:?} – {:?} KRW)",
            level, live.payment_count, live.payment_amount_min, live.payment_amount_max
        ),
        None => println!("  Commerce:   not published"),
    }

    println!("\nForecast ({} slots):", batch.forecasts.len());
    for f in &batch.forecasts {
        println!(
            "  #{:>2} {}  {:<8} {:?} – {:?}",
            f.slot,
            f.forecast_at.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            f.congestion_level.as_deref().unwrap_or("-"),
            f.population_min,
            f.population_max
        );
    }

    println!("\nIndustry segments ({}):", batch.industries.len());
    for s in &batch.industries {
        println!(
            "  {} / {}: {} ({:?} payments)",
            s.large_category,
            s.mid_category,
            s.payment_level.as_deref().unwrap_or("-"),
            s.payment_count
        );
    }
}
