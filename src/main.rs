use std::io::stdout;

use clap::Parser;
use pico_gpio_bench::{run, BenchConfig, MonotonicClock, PicoService};

const DEFAULT_PIN: usize = 4;
const DEFAULT_TOGGLES: u32 = 10_000;
const DEFAULT_DEVICE: &str = "/dev/ttyACM0";
const DEFAULT_BAUD: u32 = 2_000_000;

#[derive(Debug, clap::Parser)]
#[clap(
    name = "toggle_bench",
    about = "Toggles a PicoGPIO pin as fast as possible and reports toggles per second."
)]
struct Opts {
    #[clap(short, long, default_value_t = DEFAULT_PIN, help = "Pin to toggle.")]
    pin: usize,

    #[clap(
        short,
        long,
        default_value_t = DEFAULT_TOGGLES,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of on/off pairs to write."
    )]
    toggles: u32,

    #[clap(short, long, default_value = DEFAULT_DEVICE, help = "Serial device of the PicoGPIO.")]
    device: String,

    #[clap(short, long, default_value_t = DEFAULT_BAUD, help = "Serial baud rate.")]
    baud: u32,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::parse();
    let config = BenchConfig {
        pin: opts.pin,
        toggles: opts.toggles,
    };
    let mut service = PicoService::new(opts.device, opts.baud);

    run(
        &mut service,
        &mut MonotonicClock::new(),
        &config,
        &mut stdout().lock(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let opts = Opts::try_parse_from(["toggle_bench"]).unwrap();
        assert_eq!(opts.pin, 4);
        assert_eq!(opts.toggles, 10_000);
        assert_eq!(opts.device, "/dev/ttyACM0");
        assert_eq!(opts.baud, 2_000_000);
    }

    #[test]
    fn zero_toggles_is_refused() {
        assert!(Opts::try_parse_from(["toggle_bench", "--toggles", "0"]).is_err());
    }
}
