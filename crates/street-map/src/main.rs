mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Command, Settings};
use serde::Serialize;
use street_map_lib::{MapBuilder, MapDocument, RasterRequest, RouteRequest, StreetMap};

/// Raster answer as served to the map front end
///
/// A failed query prints its sentinel corners as `null`.
#[derive(Serialize)]
struct RasterResponse {
    #[serde(flatten)]
    result: street_map_lib::RasterResult,
    render_files: Vec<Vec<String>>,
}

fn main() -> anyhow::Result<()> {
    logging::setup_logging();
    let settings = Settings::parse();

    let map = load_map(&settings)?;
    let output = run(&map, &settings.command)?;
    println!("{output}");
    Ok(())
}

fn load_map(settings: &Settings) -> anyhow::Result<StreetMap> {
    profiling::scope!("load_map");

    let document = MapDocument::from_path(&settings.map)
        .with_context(|| format!("Failed to read map {}", settings.map.display()))?;
    tracing::info!(
        "Loaded {}: {} nodes, {} ways, {} places",
        settings.map.display(),
        document.nodes.len(),
        document.ways.len(),
        document.places.len()
    );

    MapBuilder::from_document(settings.config(), &document)
        .build()
        .context("Failed to build street map")
}

/// Answer one query, rendered as pretty JSON
fn run(map: &StreetMap, command: &Command) -> anyhow::Result<String> {
    let output = match *command {
        Command::Raster {
            ul_lon,
            ul_lat,
            lr_lon,
            lr_lat,
            width,
            height,
        } => {
            let result = map.raster(&RasterRequest {
                ul_lon,
                ul_lat,
                lr_lon,
                lr_lat,
                width,
                height,
            });
            if !result.query_success {
                tracing::warn!("Raster query failed: box is inverted or outside the map");
            }
            let render_files = map.tile_file_names(&result);
            serde_json::to_string_pretty(&RasterResponse {
                result,
                render_files,
            })?
        }
        Command::Search { ref prefix } => serde_json::to_string_pretty(&map.search(prefix))?,
        Command::Locate { ref name } => serde_json::to_string_pretty(&map.locate(name))?,
        Command::Route {
            start_lon,
            start_lat,
            dest_lon,
            dest_lat,
        } => {
            let path = map.route(&RouteRequest {
                start_lon,
                start_lat,
                dest_lon,
                dest_lat,
            });
            if path.is_empty() {
                tracing::warn!("No route found");
            }
            serde_json::to_string_pretty(&path)?
        }
        Command::Info => serde_json::to_string_pretty(&map.info())?,
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_map() -> StreetMap {
        let settings = Settings::try_parse_from([
            "street-map",
            "--map",
            concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/berkeley.json"),
            "info",
        ])
        .unwrap();
        load_map(&settings).unwrap()
    }

    #[test]
    fn test_search_output() {
        let map = demo_map();
        let output = run(
            &map,
            &Command::Search {
                prefix: "sather".to_string(),
            },
        )
        .unwrap();
        let names: Vec<String> = serde_json::from_str(&output).unwrap();
        assert_eq!(names, vec!["Sather Gate", "Sather Tower"]);
    }

    #[test]
    fn test_raster_output_flattens_result() {
        let map = demo_map();
        let output = run(
            &map,
            &Command::Raster {
                ul_lon: -122.26,
                ul_lat: 37.87,
                lr_lon: -122.25,
                lr_lat: 37.86,
                width: 1024.0,
                height: 768.0,
            },
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["query_success"], true);
        assert!(value["render_grid"].is_array());
        let first = value["render_files"][0][0].as_str().unwrap();
        assert!(first.starts_with("img/") && first.ends_with(".png"));
    }

    #[test]
    fn test_failed_raster_output() {
        let map = demo_map();
        let output = run(
            &map,
            &Command::Raster {
                ul_lon: -122.25,
                ul_lat: 37.87,
                lr_lon: -122.26,
                lr_lat: 37.86,
                width: 1024.0,
                height: 768.0,
            },
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["query_success"], false);
        assert_eq!(value["depth"], 0);
        assert!(value["render_grid"].is_null());
        for corner in ["raster_ul_lon", "raster_ul_lat", "raster_lr_lon", "raster_lr_lat"] {
            assert!(value[corner].is_null(), "{corner} should be null");
        }
        assert_eq!(value["render_files"], serde_json::json!([]));
    }

    #[test]
    fn test_route_and_info_output() {
        let map = demo_map();
        let output = run(
            &map,
            &Command::Route {
                start_lon: -122.260,
                start_lat: 37.870,
                dest_lon: -122.260,
                dest_lat: 37.860,
            },
        )
        .unwrap();
        let path: Vec<u64> = serde_json::from_str(&output).unwrap();
        assert_eq!(path, vec![101, 104, 107]);

        let info: serde_json::Value =
            serde_json::from_str(&run(&map, &Command::Info).unwrap()).unwrap();
        assert_eq!(info["vertex_count"], 9);
    }

    #[test]
    fn test_missing_map_file() {
        let settings = Settings::try_parse_from([
            "street-map",
            "--map",
            "/nonexistent/street-map.json",
            "info",
        ])
        .unwrap();
        assert!(load_map(&settings).is_err());
    }
}
