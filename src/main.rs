use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use moksha_patam::{
    client::{
        self,
        AppConfig,
        GatewayTargetConfig,
        RoomAction,
    },
    profiles,
    types::Address,
    wallets,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use tracing_subscriber::EnvFilter;

const DEFAULT_DATA_DIR: &str = ".moksha";
const DEFAULT_STAKE: u128 = 1_000;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: moksha-patam (--url <url> --contract <addr> | --offline)\n\
         (--profile <name> [--profile-dir <path>] | --address <0x..>)\n\
         (--room <id> | --join <id> | --create <players> [--stake <amount>] [--metadata-uri <uri>])\n\
         [--data-dir <path>]\n\
         \n\
         Flags:\n\
           --url <url>           Gateway bridge endpoint\n\
           --contract <addr>     Game contract address (for receipt decoding)\n\
           --offline             Play a local demo room against simulated opponents\n\
           --profile <name>      Named profile holding the player address\n\
           --profile-dir <path>  Override the profile directory (defaults to ~/.moksha/profiles)\n\
           --address <0x..>      Player address; combined with --profile it is saved under that name\n\
           --room <id>           Enter a room this address already belongs to\n\
           --join <id>           Join the room, then enter it\n\
           --create <players>    Create a room for that many players and enter it\n\
           --stake <amount>      Stake for --create (default {DEFAULT_STAKE})\n\
           --metadata-uri <uri>  Metadata URI for --create\n\
           --data-dir <path>     Where positions and logs live (default {DEFAULT_DATA_DIR})"
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut url: Option<String> = None;
    let mut contract: Option<String> = None;
    let mut offline = false;
    let mut profile: Option<String> = None;
    let mut profile_dir: Option<String> = None;
    let mut address: Option<String> = None;
    let mut room: Option<u64> = None;
    let mut join: Option<u64> = None;
    let mut create: Option<u32> = None;
    let mut stake: Option<u128> = None;
    let mut metadata_uri: Option<String> = None;
    let mut data_dir: Option<String> = None;

    fn take_value(
        args: &mut impl Iterator<Item = String>,
        flag: &str,
        slot: &mut Option<String>,
    ) -> Result<()> {
        let value = args
            .next()
            .ok_or_else(|| eyre!("{flag} requires an argument"))?;
        if slot.is_some() {
            return Err(eyre!("{flag} may only be specified once"));
        }
        *slot = Some(value);
        Ok(())
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => take_value(&mut args, "--url", &mut url)?,
            "--contract" => take_value(&mut args, "--contract", &mut contract)?,
            "--offline" => offline = true,
            "--profile" => take_value(&mut args, "--profile", &mut profile)?,
            "--profile-dir" => {
                take_value(&mut args, "--profile-dir", &mut profile_dir)?
            }
            "--address" => take_value(&mut args, "--address", &mut address)?,
            "--room" => {
                if room.is_some() {
                    return Err(eyre!("--room may only be specified once"));
                }
                let mut raw = None;
                take_value(&mut args, "--room", &mut raw)?;
                room = Some(parse_room_id(&raw.unwrap_or_default())?);
            }
            "--join" => {
                if join.is_some() {
                    return Err(eyre!("--join may only be specified once"));
                }
                let mut raw = None;
                take_value(&mut args, "--join", &mut raw)?;
                join = Some(parse_room_id(&raw.unwrap_or_default())?);
            }
            "--create" => {
                if create.is_some() {
                    return Err(eyre!("--create may only be specified once"));
                }
                let mut raw = None;
                take_value(&mut args, "--create", &mut raw)?;
                let n: u32 = raw
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| eyre!("--create requires a player count"))?;
                create = Some(n);
            }
            "--stake" => {
                if stake.is_some() {
                    return Err(eyre!("--stake may only be specified once"));
                }
                let mut raw = None;
                take_value(&mut args, "--stake", &mut raw)?;
                let n: u128 = raw
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| eyre!("--stake requires an integer amount"))?;
                stake = Some(n);
            }
            "--metadata-uri" => {
                take_value(&mut args, "--metadata-uri", &mut metadata_uri)?
            }
            "--data-dir" => take_value(&mut args, "--data-dir", &mut data_dir)?,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let target = match (offline, url, contract) {
        (true, None, None) => GatewayTargetConfig::Offline,
        (true, _, _) => {
            return Err(eyre!("--offline cannot be combined with --url/--contract"));
        }
        (false, Some(base_url), Some(raw_contract)) => GatewayTargetConfig::Http {
            base_url,
            contract: raw_contract
                .parse()
                .wrap_err("parsing --contract failed")?,
        },
        (false, _, _) => {
            return Err(eyre!(
                "Select a gateway with --url <url> --contract <addr>, or --offline"
            ));
        }
    };

    let resolved_address = resolve_address(
        offline,
        profile.as_deref(),
        profile_dir.as_deref(),
        address.as_deref(),
    )?;

    let room_action = match (room, join, create) {
        (Some(id), None, None) => RoomAction::Enter(id),
        (None, Some(id), None) => RoomAction::Join(id),
        (None, None, Some(required_participants)) => RoomAction::Create {
            required_participants,
            stake_amount: stake.unwrap_or(DEFAULT_STAKE),
            metadata_uri: metadata_uri.unwrap_or_default(),
        },
        (None, None, None) if offline => {
            // The offline session seeds its own demo room.
            RoomAction::Enter(0)
        }
        (None, None, None) => {
            return Err(eyre!(
                "Select a room with --room <id>, --join <id>, or --create <players>"
            ));
        }
        _ => {
            return Err(eyre!(
                "--room, --join, and --create are mutually exclusive"
            ));
        }
    };

    Ok(AppConfig {
        target,
        address: resolved_address,
        room: room_action,
        data_root: PathBuf::from(data_dir.unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
    })
}

fn parse_room_id(raw: &str) -> Result<u64> {
    let id: u64 = raw
        .parse()
        .map_err(|_| eyre!("'{raw}' is not a valid room id"))?;
    if id == 0 {
        return Err(eyre!("room ids start at 1"));
    }
    Ok(id)
}

fn resolve_address(
    offline: bool,
    profile: Option<&str>,
    profile_dir: Option<&str>,
    address: Option<&str>,
) -> Result<Address> {
    match (profile, address) {
        (Some(name), Some(raw)) => {
            let parsed: Address = raw.parse().wrap_err("parsing --address failed")?;
            let dir = wallets::resolve_profile_dir(profile_dir)?;
            wallets::save_profile(&dir, name, parsed)?;
            profiles::remember(parsed, name);
            Ok(parsed)
        }
        (Some(name), None) => {
            let dir = wallets::resolve_profile_dir(profile_dir)?;
            let descriptor = wallets::find_profile(&dir, name)?;
            let parsed = wallets::load_address(&descriptor)?;
            profiles::remember(parsed, name);
            Ok(parsed)
        }
        (None, Some(raw)) => raw.parse().wrap_err("parsing --address failed"),
        (None, None) if offline => Ok(Address::ZERO),
        (None, None) => Err(eyre!(
            "Select a player with --profile <name> or --address <0x..>"
        )),
    }
}

fn init_tracing(data_root: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = data_root.join("logs");
    fs::create_dir_all(&log_dir).wrap_err("Failed to create log directory")?;
    let appender = tracing_appender::rolling::daily(&log_dir, "moksha.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = parse_cli_args()?;
    let _log_guard = init_tracing(&config.data_root)?;
    tracing::info!("starting moksha-patam client");
    client::run_app(config).await
}
