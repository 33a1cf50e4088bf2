use std::{path::PathBuf, str::FromStr};

use clap::ValueHint;
use nalgebra::Vector3;
use octpath::{spatial::Aabb, ConnectionType, SearchMode, WorldPoint};

type ParseError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum LogFormat {
    Compact,
    Full,
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => f.write_str("compact"),
            LogFormat::Full => f.write_str("full"),
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum Connection {
    Transitable,
    Intransitable,
    Both,
}

impl From<Connection> for ConnectionType {
    fn from(value: Connection) -> Self {
        match value {
            Connection::Transitable => Self::TRANSITABLE,
            Connection::Intransitable => Self::INTRANSITABLE,
            Connection::Both => Self::BOTH,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum Mode {
    Dijkstra,
    AStar,
    Theta,
}

impl From<Mode> for SearchMode {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Dijkstra => Self::Dijkstra,
            Mode::AStar => Self::AStar,
            Mode::Theta => Self::Theta,
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Logging output filters; comma-separated
    #[arg(
        short,
        long,
        default_value = "warn,octpath=info,navbake=info",
        env = "NAVBAKE_LOG_FILTER"
    )]
    pub log_filter: String,
    /// Logging output format
    #[arg(long, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
    /// Center of the baked volume
    #[arg(short, long, default_value = "0,0,0", value_parser = parse_point, value_name = "X,Y,Z")]
    pub center: WorldPoint,
    /// Edge length of the baked volume
    #[arg(short, long, default_value_t = 64.0)]
    pub size: f32,
    /// How many times space may be subdivided
    #[arg(short, long, default_value_t = 5)]
    pub depth: u8,
    /// Which leaves get linked together
    #[arg(long, default_value = "transitable")]
    pub connection: Connection,
    /// Blocking boxes; repeat for more than one
    #[arg(short, long = "block", value_parser = parse_aabb, value_name = "X,Y,Z:X,Y,Z")]
    pub blocks: Vec<Aabb>,
    /// Load a baked octree instead of baking one
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output")]
    pub load: Option<PathBuf>,
    /// Write the baked octree here
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// Print every octant of the tree
    #[arg(long)]
    pub print_tree: bool,
    /// Start of a path query
    #[arg(long, value_parser = parse_point, value_name = "X,Y,Z", requires = "to")]
    pub from: Option<WorldPoint>,
    /// End of a path query
    #[arg(long, value_parser = parse_point, value_name = "X,Y,Z", requires = "from")]
    pub to: Option<WorldPoint>,
    /// Search algorithm for the path query
    #[arg(short, long, default_value = "theta")]
    pub mode: Mode,
    /// Give up the path query after this many search steps
    #[arg(long)]
    pub steps: Option<u64>,
}

fn parse_vec3<R: FromStr>(s: &str) -> Result<Vector3<R>, ParseError>
where
    <R as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let mut split = s.trim().split(',');
    let mut next = || -> Result<R, ParseError> {
        let part = split.next().ok_or("expected three comma-separated components")?;
        Ok(R::from_str(part.trim())?)
    };
    let v = nalgebra::vector![next()?, next()?, next()?];
    if split.next().is_some() {
        return Err("expected three comma-separated components".into());
    }
    Ok(v)
}

fn parse_point(s: &str) -> Result<WorldPoint, ParseError> {
    parse_vec3::<f32>(s).map(WorldPoint::from)
}

fn parse_aabb(s: &str) -> Result<Aabb, ParseError> {
    let (mins, maxs) = s.split_once(':').ok_or("expected MIN:MAX")?;
    let (mins, maxs) = (parse_point(mins)?, parse_point(maxs)?);
    if (0..3).any(|a| mins[a] > maxs[a]) {
        return Err(format!("box minimum {mins} exceeds maximum {maxs}").into());
    }
    Ok(Aabb::new(mins, maxs))
}

/// Set up pretty log output
pub(crate) fn initialize_tracing(log_filter: &str, log_format: LogFormat) {
    let tsub = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::OffsetTime::new(
            time::UtcOffset::current_local_offset().unwrap_or_else(|e| {
                tracing::warn!("couldn't get local time offset: {:?}", e);
                time::UtcOffset::UTC
            }),
            time::macros::format_description!("[hour]:[minute]:[second]"),
        ))
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_env_filter(log_filter);

    match log_format {
        LogFormat::Compact => tsub.compact().init(),
        LogFormat::Full => tsub.init(),
        LogFormat::Pretty => tsub.pretty().init(),
        LogFormat::Json => tsub.json().init(),
    }
}
