use clap::{Parser, Subcommand};
use std::path::PathBuf;
use street_map_lib::Config;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Street Map - tile, place-name and route queries over a static city map
pub struct Settings {
    /// JSON map document to load
    #[clap(short, long, value_name = "FILE")]
    pub map: PathBuf,

    /// Depth of the deepest pre-rendered tiles (root = 0, at most 10)
    #[clap(long, default_value = "7")]
    pub max_depth: u32,

    /// Width in pixels of every tile image
    #[clap(long, default_value = "256")]
    pub tile_size: u32,

    /// Prefix prepended to tile identifiers when naming image files
    #[clap(long, default_value = "img/")]
    pub image_prefix: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Select the tiles covering a viewport
    Raster {
        #[clap(long, allow_hyphen_values = true)]
        ul_lon: f64,
        #[clap(long, allow_hyphen_values = true)]
        ul_lat: f64,
        #[clap(long, allow_hyphen_values = true)]
        lr_lon: f64,
        #[clap(long, allow_hyphen_values = true)]
        lr_lat: f64,
        /// Viewport width in pixels
        #[clap(long)]
        width: f64,
        /// Viewport height in pixels
        #[clap(long)]
        height: f64,
    },

    /// Autocomplete place names by prefix
    Search { prefix: String },

    /// List every location with the given name
    Locate { name: String },

    /// Shortest route between the vertices nearest to two positions
    Route {
        #[clap(long, allow_hyphen_values = true)]
        start_lon: f64,
        #[clap(long, allow_hyphen_values = true)]
        start_lat: f64,
        #[clap(long, allow_hyphen_values = true)]
        dest_lon: f64,
        #[clap(long, allow_hyphen_values = true)]
        dest_lat: f64,
    },

    /// Print map statistics
    Info,
}

impl Settings {
    /// Library configuration derived from the command line
    pub fn config(&self) -> Config {
        Config {
            max_depth: self.max_depth,
            tile_size: self.tile_size,
            image_prefix: self.image_prefix.clone(),
            ..Config::default()
        }
    }
}
