use anyhow::{bail, Context, Result};
use log::info;

use photo_finder::config::Config;
use photo_finder::db::SqliteCatalog;
use photo_finder::generator::OllamaGenerator;
use photo_finder::metadata::{location_to_readable, timestamp_to_readable};
use photo_finder::search::{SearchService, SearchSettings, SearchStatus};

const USAGE: &str = "usage:
  photo-finder search [--json] <text...>
  photo-finder settings
  photo-finder set-metadata <on|off>
  photo-finder set-max-photos <n>";

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    info!("Database: {}", config.db_path);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    let catalog = SqliteCatalog::open(&config.db_path).context("failed to open catalog")?;

    match command.as_str() {
        "search" => {
            let (json, words) = match rest.split_first() {
                Some((flag, words)) if flag == "--json" => (true, words),
                _ => (false, rest),
            };
            if words.is_empty() {
                bail!(USAGE);
            }
            let generator = OllamaGenerator::new(&config.generator);
            info!(
                "Using model {} at {}",
                config.generator.model,
                generator.endpoint()
            );
            let service = SearchService::new(catalog, generator);
            run_search(&service, &words.join(" "), json)
        }
        "settings" => {
            println!("use_metadata: {}", catalog.use_metadata()?);
            println!("max_photos: {}", catalog.max_photos()?);
            println!("last_opened_dir: {}", catalog.last_opened_dir()?);
            for folder in catalog.folders()? {
                println!("folder: {}", folder);
            }
            Ok(())
        }
        "set-metadata" => {
            let use_metadata = match rest.first().map(String::as_str) {
                Some("on") => true,
                Some("off") => false,
                _ => bail!(USAGE),
            };
            catalog.set_use_metadata(use_metadata)?;
            Ok(())
        }
        "set-max-photos" => {
            let max_photos: usize = rest
                .first()
                .context(USAGE)?
                .parse()
                .context("max photos must be a positive number")?;
            catalog.set_max_photos(max_photos)?;
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

fn run_search(
    service: &SearchService<SqliteCatalog, OllamaGenerator>,
    request: &str,
    json: bool,
) -> Result<()> {
    let outcome = service.search(request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for failure in &outcome.failures {
        eprintln!("warning: could not read {:?} from the model: {}", failure.field, failure.reason);
    }

    match outcome.status() {
        SearchStatus::NoMatches => println!("No photos matched your search"),
        SearchStatus::Matches(_) => {
            for path in &outcome.paths {
                let details = service.catalog().photo(path)?;
                let location = details
                    .as_ref()
                    .and_then(|photo| photo.location.as_deref())
                    .and_then(location_to_readable);
                let taken = details
                    .as_ref()
                    .and_then(|photo| photo.timestamp.as_deref())
                    .and_then(timestamp_to_readable);

                match (location, taken) {
                    (Some(location), Some(taken)) => println!("{}\t{}\t{}", path, taken, location),
                    (None, Some(taken)) => println!("{}\t{}", path, taken),
                    (Some(location), None) => println!("{}\t{}", path, location),
                    (None, None) => println!("{}", path),
                }
            }
        }
    }

    Ok(())
}
