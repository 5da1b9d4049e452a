//! flagkit - command line front end for the embedded flag library
//!
//! Commands:
//! - `list`: available flags with their country names
//! - `search <query>`: registry search by name or native name
//! - `info <code>`: country metadata as JSON
//! - `render <code> [options]`: HTML for a flag view
//! - `selector [options]`: HTML for an open country selector

use flagkit::fetch::prefetch;
use flagkit::{
    Config, CountrySelector, FlagLibrary, FlagProps, FlagView, HttpAssets, RegistryError,
    SelectorProps,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors surfaced to the command line
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Handle --version flag
    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("flagkit {}", VERSION);
        return;
    }

    // Handle --help flag
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    // Initialize logging (stderr, so HTML output stays clean)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    if let Err(e) = run(&args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), CliError> {
    let config = Config::load();
    let library = Arc::new(FlagLibrary::builtin()?);
    info!("Loaded {} flag icons", flagkit::flag_count());

    let (command, rest) = args
        .split_first()
        .ok_or_else(|| CliError::Usage("missing command".to_string()))?;

    match command.as_str() {
        "list" => {
            for code in library.country_codes() {
                let name = library.country_info(code).map(|c| c.name.as_str()).unwrap_or("-");
                println!("{}  {}", code, name);
            }
        }
        "search" => {
            let query = rest.join(" ");
            let hits = library.registry().search(&query);
            if hits.is_empty() {
                println!("No countries found");
            }
            for info in hits {
                println!("{}  {}", info.code, info.name);
            }
        }
        "info" => {
            let code = positional(rest, "info")?;
            match library.country_info(code) {
                Some(info) => println!("{}", serde_json::to_string_pretty(info)?),
                None => return Err(CliError::Usage(format!("no metadata for {:?}", code))),
            }
        }
        "render" => {
            let code = positional(rest, "render")?;
            let props = flag_props(code, rest, &config)?;
            let mut view = FlagView::new(library.clone(), props);

            let remote = option_value(rest, "--remote").or(config.asset_base_url.as_deref());
            if let Some(base_url) = remote {
                let source = HttpAssets::new(base_url).with_timeout(config.fetch_timeout());
                view.load(&source).await;
            } else {
                view.load_embedded();
            }
            if let Some(reason) = view.state().reason() {
                warn!("{}", reason);
            }
            println!("{}", view.render());
        }
        "selector" => {
            let max_results = match option_value(rest, "--max") {
                Some(raw) => parse_number(raw, "--max")?,
                None => config.max_results,
            };
            let mut props = SelectorProps::default().max_results(max_results);
            if let Some(value) = option_value(rest, "--value") {
                props = props.value(value);
            }
            let remote = option_value(rest, "--remote").or(config.asset_base_url.as_deref());
            let library = match remote {
                Some(base_url) => {
                    let source = HttpAssets::new(base_url).with_timeout(config.fetch_timeout());
                    let codes = library.country_codes();
                    let store = prefetch(&source, &codes).await;
                    Arc::new(FlagLibrary::new(store, library.registry().clone()))
                }
                None => library,
            };
            let mut selector = CountrySelector::new(library, props);
            selector.open();
            if let Some(query) = option_value(rest, "--query") {
                selector.set_query(query);
            }
            println!("{}", selector.render());
        }
        other => return Err(CliError::Usage(format!("unknown command {:?}", other))),
    }
    Ok(())
}

fn flag_props(code: &str, args: &[String], config: &Config) -> Result<FlagProps, CliError> {
    let width = match option_value(args, "--width") {
        Some(raw) => parse_number(raw, "--width")?,
        None => config.default_width,
    };
    let mut props = FlagProps::new(code).width(width);

    if let Some(raw) = option_value(args, "--height") {
        props = props.height(parse_number(raw, "--height")?);
    }
    if let Some(class) = option_value(args, "--class") {
        props = props.class(class);
    }
    if let Some(label) = option_value(args, "--label") {
        props = props.label(label);
    }
    if let Some(color) = option_value(args, "--border-color") {
        let width = props.border_width;
        props = props.border(color, width);
    }
    if args.iter().any(|a| a == "--border") {
        props = props.show_border(true);
    }
    if args.iter().any(|a| a == "--clickable") {
        props = props.clickable(true);
    }
    if args.iter().any(|a| a == "--placeholder") {
        props = props.placeholder_image(true);
    }
    Ok(props)
}

/// First argument that is neither a flag nor a flag's value
fn positional<'a>(args: &'a [String], command: &str) -> Result<&'a str, CliError> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = takes_value(arg);
            continue;
        }
        return Ok(arg);
    }
    Err(CliError::Usage(format!("{} needs a country code", command)))
}

fn takes_value(flag: &str) -> bool {
    matches!(
        flag,
        "--width" | "--height" | "--class" | "--label" | "--border-color" | "--remote" | "--max"
            | "--value" | "--query"
    )
}

fn option_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T, CliError> {
    raw.parse()
        .map_err(|_| CliError::Usage(format!("{} expects a number, got {:?}", flag, raw)))
}

fn print_help() {
    println!("flagkit {}", VERSION);
    println!();
    println!("Embedded SVG country flags.");
    println!();
    println!("USAGE:");
    println!("    flagkit <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    list                 List embedded flags");
    println!("    search <query>       Search countries by name");
    println!("    info <code>          Show country metadata as JSON");
    println!("    render <code>        Print the HTML for a flag");
    println!("    selector             Print the HTML for an open country selector");
    println!();
    println!("RENDER OPTIONS:");
    println!("    --width <px>         Flag width (default from config, 32)");
    println!("    --height <px>        Flag height (default width * 336 / 512)");
    println!("    --class <name>       CSS class for the SVG");
    println!("    --label <text>       Accessible label");
    println!("    --border             Draw a border");
    println!("    --border-color <c>   Border colour (implies --border)");
    println!("    --clickable          Pointer cursor and hover effect");
    println!("    --placeholder        Grey placeholder image instead of the warning glyph");
    println!("    --remote <url>       Fetch from <url>/flags/<code>.svg (or $FLAGKIT_ASSET_URL)");
    println!();
    println!("SELECTOR OPTIONS:");
    println!("    --query <text>       Search text");
    println!("    --max <n>            Maximum entries (default 50)");
    println!("    --value <code>       Currently selected country");
    println!("    --remote <url>       Prefetch flags from <url> instead of the embedded set");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help           Show this help message");
    println!("    -v, --version        Show version");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_skips_flag_values() {
        let a = args(&["--width", "64", "--border", "de"]);
        assert_eq!(positional(&a, "render").unwrap(), "de");
        assert!(positional(&args(&["--width", "64"]), "render").is_err());
    }

    #[test]
    fn test_flag_props_from_args() {
        let a = args(&["us", "--width", "64", "--class", "big", "--clickable"]);
        let props = flag_props("us", &a, &Config::default()).unwrap();
        assert_eq!(props.width, 64.0);
        assert_eq!(props.class.as_deref(), Some("big"));
        assert!(props.clickable);
        assert!(!props.show_border);
        assert!(!props.placeholder_image);

        let a = args(&["xx", "--placeholder"]);
        assert!(flag_props("xx", &a, &Config::default()).unwrap().placeholder_image);
    }

    #[test]
    fn test_bad_number() {
        let a = args(&["us", "--width", "wide"]);
        assert!(matches!(flag_props("us", &a, &Config::default()), Err(CliError::Usage(_))));
    }
}
