//! A headless blackjack client.
//!
//! Waits for a server Offer (or connects to `--server` directly), plays the
//! requested rounds with a fixed stand-on threshold and reports the win rate.

use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use blackjack::{
    Client,
    client::{RoundRecord, stand_on},
    discovery::{DISCOVERY_PORT, OfferListener},
};
use log::{debug, info};
use pico_args::Arguments;

const HELP: &str = "\
Play blackjack against a discoverable server

USAGE:
  bj_client [OPTIONS]

OPTIONS:
  --server    IP:PORT   Connect directly instead of waiting for an offer
  --listen    IP:PORT   Where to listen for offers  [default: 0.0.0.0:13122]
  --rounds    N         Rounds to play, 1 to 255     [default: 1]
  --name      NAME      Name sent to the server      [default: NivTheMaster]
  --stand-on  N         Stand once the hand reaches this total  [default: 17]

FLAGS:
  -h, --help            Print help information
";

const DEFAULT_NAME: &str = "NivTheMaster";

struct Args {
    server: Option<SocketAddr>,
    listen: SocketAddr,
    rounds: u8,
    name: String,
    stand_on: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        server: pargs.opt_value_from_str("--server")?,
        listen: pargs
            .opt_value_from_str("--listen")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DISCOVERY_PORT))),
        rounds: pargs.opt_value_from_str("--rounds")?.unwrap_or(1),
        name: pargs
            .opt_value_from_str("--name")?
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        stand_on: pargs.opt_value_from_str("--stand-on")?.unwrap_or(17),
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }
    if args.rounds == 0 {
        bail!("--rounds must be between 1 and 255");
    }

    env_logger::builder().format_target(false).init();

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let addr = match args.server {
        Some(addr) => addr,
        None => discover(args.listen).await?,
    };

    let mut client = Client::connect(&addr, &args.name, args.rounds).await?;
    info!("connected to {addr} as {}", client.name);

    let tally = client
        .play_session(args.rounds, stand_on(args.stand_on), print_round)
        .await
        .context("session ended early")?;

    debug!("{tally}");
    println!(
        "Finished playing {} rounds, win rate: {:.1}%",
        tally.rounds(),
        tally.win_rate()
    );
    Ok(())
}

async fn discover(listen: SocketAddr) -> Result<SocketAddr> {
    let listener =
        OfferListener::bind(listen).with_context(|| format!("failed to listen on {listen}"))?;
    println!("Listening for offers on {listen}...");
    let (offer, from) = listener.recv_offer().await?;
    let addr = SocketAddr::new(from.ip(), offer.tcp_port);
    println!(
        "Received offer from server '{}' at {addr}, attempting to connect...",
        offer.server_name
    );
    Ok(addr)
}

fn print_round(round: u8, record: &RoundRecord) {
    println!(
        "Round {round}: {} | you {} | dealer {}",
        record.result, record.player, record.dealer
    );
}
