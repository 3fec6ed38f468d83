use anyhow::{Result, anyhow, bail};
use choropleth::scale::{ColorScheme, DomainSpec, ScaleMode};
use choropleth::viz::LegendConfig;
use choropleth::{Choropleth, ChoroplethOptions, Color, DataRecord, Feature};
use choropleth::{stats, storage};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "choropleth",
    version,
    about = "Bind data to GeoJSON polygons and render choropleth maps"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a map to SVG or PNG (chosen by the --out extension).
    Render(RenderArgs),
    /// Bind data to features and save or summarize the result.
    Bind(BindArgs),
    /// Print the legend entries of the color scale.
    Legend(LegendArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Quantize,
    Continuous,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// GeoJSON FeatureCollection with polygon features.
    #[arg(short, long)]
    features: PathBuf,
    /// Dataset (.csv with header, or JSON array of objects).
    #[arg(short, long)]
    data: PathBuf,
    /// JSON options file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Key path compared on features and records (default: id).
    #[arg(long = "match")]
    match_key: Option<String>,
    /// Record field holding the value (default: value).
    #[arg(long)]
    value: Option<String>,
    /// Feature attribute used as label (default: id).
    #[arg(long)]
    label: Option<String>,
    /// Scheme name (e.g. Blues, viridis) or comma-separated hex colors.
    #[arg(long)]
    colors: Option<String>,
    #[arg(long, value_enum)]
    scale_mode: Option<Mode>,
    /// `auto` or MIN:MAX
    #[arg(long)]
    domain: Option<String>,
    /// Value format such as `.2f`, `,.0f`, `.1%` or `.2s`.
    #[arg(long)]
    value_format: Option<String>,
    #[arg(long)]
    unknown_color: Option<String>,
    /// Outer width in pixels (default 800).
    #[arg(long)]
    width: Option<u32>,
    /// Outer height in pixels (default 500).
    #[arg(long)]
    height: Option<u32>,
    /// Draw the graticule layer.
    #[arg(long, default_value_t = false)]
    graticule: bool,
    /// Hide the graticule even if the options file enables it.
    #[arg(long, default_value_t = false, conflicts_with = "graticule")]
    no_graticule: bool,
    /// Locale for number grouping (en, de, fr, ...).
    #[arg(long)]
    locale: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Output image (.svg or .png).
    #[arg(long)]
    out: PathBuf,
    /// TTF/OTF font used for labels in bitmap output.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Do not add a default legend when the options define none.
    #[arg(long, default_value_t = false)]
    no_legend: bool,
}

#[derive(Args, Debug)]
struct BindArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Save bound features (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Print binding statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Args, Debug)]
struct LegendArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Print entries as JSON instead of one line per entry.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_domain(s: &str) -> Result<DomainSpec> {
    if s.trim().eq_ignore_ascii_case("auto") {
        return Ok(DomainSpec::Auto);
    }
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("invalid --domain `{s}`, expected auto or MIN:MAX"))?;
    let min = a.trim().parse::<f64>()?;
    let max = b.trim().parse::<f64>()?;
    Ok(DomainSpec::Explicit { min, max })
}

fn parse_colors(s: &str) -> Result<ColorScheme> {
    if s.contains(',') || s.starts_with('#') {
        let colors = s
            .split(',')
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(Color::from_hex)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ColorScheme::Palette(colors))
    } else {
        Ok(ColorScheme::Named(s.trim().to_string()))
    }
}

/// Config file first, flags on top.
fn build_options(args: &CommonArgs) -> Result<ChoroplethOptions> {
    let base = match &args.config {
        Some(path) => ChoroplethOptions::load(path)?,
        None => ChoroplethOptions::default(),
    };
    let flags = ChoroplethOptions {
        match_key: args.match_key.clone(),
        value: args.value.clone(),
        label: args.label.clone(),
        colors: args.colors.as_deref().map(parse_colors).transpose()?,
        scale_mode: args.scale_mode.map(|m| match m {
            Mode::Quantize => ScaleMode::Quantize,
            Mode::Continuous => ScaleMode::Continuous,
        }),
        domain: args.domain.as_deref().map(parse_domain).transpose()?,
        value_format: args.value_format.clone(),
        unknown_color: args
            .unknown_color
            .as_deref()
            .map(Color::from_hex)
            .transpose()?,
        width: args.width,
        height: args.height,
        enable_graticule: match (args.graticule, args.no_graticule) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        locale: args.locale.clone(),
        ..Default::default()
    };
    Ok(base.merge(flags))
}

fn load_inputs(args: &CommonArgs) -> Result<(Vec<Feature>, Vec<DataRecord>)> {
    let features = storage::load_features(&args.features)?;
    let records = storage::load_records(&args.data)?;
    Ok((features, records))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Bind(args) => cmd_bind(args),
        Command::Legend(args) => cmd_legend(args),
    }
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let mut options = build_options(&args.common)?;
    if options.legends.is_none() && !args.no_legend {
        options.legends = Some(vec![LegendConfig::default()]);
    }
    let font_path = args
        .font
        .clone()
        .or_else(|| options.font_path.as_ref().map(PathBuf::from));
    let (features, records) = load_inputs(&args.common)?;

    let map = Choropleth::from_options(&options)?.render(&features, &records)?;
    map.save(&args.out, font_path.as_deref())?;
    eprintln!(
        "Wrote map of {} features ({} matched) to {}",
        map.binding.features.len(),
        map.binding.matched().count(),
        args.out.display()
    );
    Ok(())
}

fn cmd_bind(args: BindArgs) -> Result<()> {
    let options = build_options(&args.common)?;
    let (features, records) = load_inputs(&args.common)?;
    let binding = options.resolve()?.binder.bind(&features, &records)?;

    if let Some(path) = args.out.as_ref() {
        save_binding(&binding, path, args.format)?;
        eprintln!("Saved {} rows to {}", binding.features.len(), path.display());
    }

    if args.stats {
        let s = stats::binding_summary(&binding);
        println!(
            "features={} matched={} unmatched={}  min={} max={} mean={} median={}",
            s.features,
            s.matched,
            s.unmatched,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    Ok(())
}

fn save_binding(binding: &choropleth::Binding, path: &Path, format: Option<OutFormat>) -> Result<()> {
    let fmt = match format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(binding, path),
        "json" => storage::save_json(binding, path),
        other => bail!("unsupported format: {}", other),
    }
}

fn cmd_legend(args: LegendArgs) -> Result<()> {
    let options = build_options(&args.common)?;
    let (features, records) = load_inputs(&args.common)?;
    let binding = options.resolve()?.binder.bind(&features, &records)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&binding.legend)?);
    } else {
        for entry in &binding.legend {
            println!("{}\t{}", entry.color, entry.label);
        }
    }
    Ok(())
}
