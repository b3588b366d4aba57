use crate::infra::MapService;
use clap::Args;
use client_map::config::AppConfig;
use client_map::error::AppError;
use client_map::workflows::client_map::RegionCount;
use std::fmt::Write;

#[derive(Args, Debug, Default)]
pub(crate) struct RegionsArgs {
    /// Print the counts as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_regions(args: RegionsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = MapService::from_config(&config);
    let counts = service.region_counts().await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&counts)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        print!("{}", render_region_table(&counts));
    }

    Ok(())
}

fn render_region_table(counts: &[RegionCount]) -> String {
    if counts.is_empty() {
        return "No region labels found in the client list.\n".to_string();
    }

    let width = counts
        .iter()
        .map(|count| count.region.chars().count())
        .max()
        .unwrap_or(0)
        .max("Region".len());
    let total: usize = counts.iter().map(|count| count.clients).sum();

    let mut output = String::new();
    writeln!(output, "{:<width$}  Clients", "Region").expect("header row");
    for count in counts {
        writeln!(output, "{:<width$}  {:>7}", count.region, count.clients).expect("region row");
    }
    writeln!(output, "{:<width$}  {:>7}", "Total", total).expect("total row");
    output
}
