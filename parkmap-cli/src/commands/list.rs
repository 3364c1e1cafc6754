//! List command - fetch parking lots and print them.

use parkmap::usecase::GetParkingLots;

use super::common::{build_repository, print_lots, FilterArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the list command.
pub struct ListArgs {
    pub filters: FilterArgs,
    pub json: bool,
}

/// Run the list command.
pub fn run(runner: &CliRunner, args: ListArgs) -> Result<(), CliError> {
    runner.log_startup("list");
    let repository = build_repository(runner.config())?;
    let usecase = GetParkingLots::new(repository);
    let params = args.filters.to_search_params();

    let lots = runner.block_on(usecase.execute(params.as_ref()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&lots)?);
    } else {
        print_lots(&lots);
    }
    Ok(())
}
