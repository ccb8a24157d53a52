use clap::Parser;
use poi_sync::adapters::{
    FixedLocation, OsrmRoutingProvider, RecordingMap, SocrataPoiSource, UnavailableLocation,
};
use poi_sync::domain::ports::{LocationProvider, MarkerSpec};
use poi_sync::utils::error::{ErrorSeverity, SyncError};
use poi_sync::utils::format::{format_distance, format_duration};
use poi_sync::utils::{logger, validation::Validate};
use poi_sync::{CliArgs, Session, SessionEvent, SessionNotice, SessionPorts, SyncConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting poi-sync");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let location: Arc<dyn LocationProvider> = match args.center() {
        Some(center) => Arc::new(FixedLocation(center)),
        None => Arc::new(UnavailableLocation::new(
            "no positioning source on this host (pass --lat and --lng)",
        )),
    };
    let center = args.center().unwrap_or_else(|| config.default_origin());
    let map = RecordingMap::new(args.viewport_around(center));

    let ports = SessionPorts {
        restrooms: Arc::new(SocrataPoiSource::new(config.sources.restroom.clone())?),
        restaurants: Arc::new(SocrataPoiSource::new(config.sources.restaurant.clone())?),
        location,
        routing: Arc::new(OsrmRoutingProvider::new(&config.routing)?),
    };

    let (notice_tx, mut notices) = mpsc::unbounded_channel();
    let (events, event_rx) = mpsc::channel(16);
    let mut session = Session::new(config, map, ports, notice_tx);

    let want_directions = args.directions;
    let list = args.list;
    let listen = async move {
        let mut exit_code = 0;
        while let Some(notice) = notices.recv().await {
            match notice {
                SessionNotice::LocationFallback(origin) => {
                    println!("📍 Location unavailable, searching around {}", origin);
                }
                SessionNotice::PoisUpdated {
                    category, points, ..
                } => {
                    println!("📥 {} {} in view", points.len(), category.plural());
                    if list {
                        for poi in &points {
                            println!(
                                "   {} {} ({})",
                                MarkerSpec::for_poi(poi).glyph,
                                poi.display_name(),
                                poi.borough().unwrap_or("-")
                            );
                        }
                    }
                }
                SessionNotice::FetchFailed { category, message } => {
                    eprintln!("⚠️ Could not load {}: {}", category.plural(), message);
                }
                SessionNotice::RefreshCompleted { loaded: 0, .. } => {
                    eprintln!("❌ No data could be loaded");
                    exit_code = 2;
                    break;
                }
                SessionNotice::RefreshCompleted { .. } => {
                    if events.send(SessionEvent::FindNearest).await.is_err() {
                        break;
                    }
                }
                SessionNotice::SelectionChanged(Some(selection)) => {
                    println!(
                        "🚨 Nearest {}: {} ({} away)",
                        selection.poi.category(),
                        selection.poi.display_name(),
                        format_distance(selection.distance_m)
                    );
                    if !want_directions
                        || events.send(SessionEvent::RequestDirections).await.is_err()
                    {
                        break;
                    }
                }
                SessionNotice::RouteReady {
                    distance_m,
                    duration_s,
                } => {
                    println!(
                        "🧭 Walking route: {}, about {}",
                        format_distance(distance_m),
                        format_duration(duration_s)
                    );
                    break;
                }
                SessionNotice::Advisory(message) => {
                    println!("💬 {}", message);
                    break;
                }
                _ => {}
            }
        }

        if events.send(SessionEvent::Shutdown).await.is_err() {
            tracing::debug!("Session already stopped");
        }
        exit_code
    };

    let ((), exit_code) = tokio::join!(session.run(event_rx), listen);

    tracing::info!("✅ Done");
    if exit_code > 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn load_config(args: &CliArgs) -> poi_sync::Result<SyncConfig> {
    let config = match &args.config {
        Some(path) => {
            tracing::info!("📋 Loading configuration from {}", path);
            SyncConfig::from_file(path)?
        }
        None => SyncConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn exit_with(e: &SyncError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
