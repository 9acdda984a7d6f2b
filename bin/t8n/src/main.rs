use std::fs;

use args::Args;
use t8n_chaintsn::{process_block, TransitionParams};
use t8n_common::logging;
use t8n_exec::{RewardFinalizer, TransferApplier};
use t8n_primitives::prelude::*;
use t8n_state::{validate_state, WorldState};
use tracing::*;

mod args;
mod errors;
mod fixtures;
mod helpers;
mod output;

fn main() {
    let args: Args = argh::from_env();
    if args.version {
        println!("t8n {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e}");
        std::process::exit(1);
    }
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    // Init the logging before we do anything else.
    logging::init(logging::LoggerConfig::with_base_name("t8n"));

    let config = helpers::get_config(&args)?;
    let rev = config.state.fork.parse::<Revision>()?;

    let mut state = match &config.input.alloc {
        Some(path) => fixtures::load_alloc(path)?,
        None => WorldState::default(),
    };
    validate_state(&state, rev)?;

    let (mut block, hashes) = match &config.input.env {
        Some(path) => fixtures::load_env(path)?,
        None => Default::default(),
    };

    let txs = config
        .input
        .txs
        .as_deref()
        .map(fixtures::load_txs)
        .transpose()?;

    let basedir = &config.output.basedir;
    fs::create_dir_all(basedir)?;

    let params = TransitionParams {
        rev,
        chain_id: config.state.chain_id,
        reward: config.state.block_reward(),
        trace_dir: config.trace.enabled.then_some(basedir.as_path()),
    };
    info!(%rev, number = block.number, "processing block");

    let out = process_block(
        &mut state,
        &mut block,
        &hashes,
        txs,
        &params,
        &mut TransferApplier,
        &RewardFinalizer,
    )?;

    output::write_outputs(&config.output, &out, &state)?;

    logging::finalize();
    Ok(())
}
