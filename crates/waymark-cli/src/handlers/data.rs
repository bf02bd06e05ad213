//! Data command handler

use crate::error::{CliError, CliResult};
use crate::DataArgs;
use waymark::{PhoneConstraint, Seed, SyntheticDataFactory, SyntheticKind};

/// Execute the data command
pub fn execute_data(args: &DataArgs) -> CliResult<()> {
    for line in generate_lines(args)? {
        println!("{line}");
    }
    Ok(())
}

/// One JSON document per generated record
pub fn generate_lines(args: &DataArgs) -> CliResult<Vec<String>> {
    let kind: SyntheticKind = args.kind.parse()?;
    if args.count == 0 {
        return Err(CliError::invalid_argument("--count must be at least 1"));
    }
    let phone = PhoneConstraint::checked(args.phone_min, args.phone_max)?;

    let seed = args.seed.map_or_else(Seed::from_entropy, Seed::from_u64);
    let mut factory = SyntheticDataFactory::new(seed).with_phone_constraint(phone);
    tracing::debug!(%kind, count = args.count, seed = seed.value(), "generating records");

    (0..args.count)
        .map(|_| -> CliResult<String> {
            let record = factory.generate(kind);
            Ok(serde_json::to_string(&record.to_json())?)
        })
        .collect()
}
