#![forbid(unsafe_code)]

// Native-only tool. The stub keeps `--target wasm32-unknown-unknown --workspace` builds working.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::io::{self, Write};
    use std::path::PathBuf;

    use anyhow::{bail, Context, Result};
    use clap::{Parser, ValueEnum};
    use vme_bus::{Machine, MachineConfig, VME_SLOT_OPTIONS};

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum Width {
        D8,
        D16,
        D32,
    }

    impl Width {
        fn max_value(self) -> u32 {
            match self {
                Width::D8 => 0xFF,
                Width::D16 => 0xFFFF,
                Width::D32 => u32::MAX,
            }
        }
    }

    #[derive(Debug, Parser)]
    #[command(about = "Compose a VME backplane from JSON, start it and poke at its address space")]
    pub struct Args {
        /// Machine description (processors, buses, slots) as JSON.
        #[arg(long, required_unless_present = "list_cards")]
        config: Option<PathBuf>,

        /// Print the cards a slot can hold and exit.
        #[arg(long)]
        list_cards: bool,

        /// Bus whose address space `--peek`/`--poke` go to.
        #[arg(long, default_value = "vme")]
        bus: String,

        /// Access width for `--peek`/`--poke`.
        #[arg(long, value_enum, default_value_t = Width::D8)]
        width: Width,

        /// Write VALUE at ADDR (`ADDR=VALUE`, hex with `0x`). Applied in order, before any peek.
        #[arg(long, value_parser = parse_poke)]
        poke: Vec<(u32, u32)>,

        /// Read ADDR and print the value.
        #[arg(long, value_parser = parse_u32)]
        peek: Vec<u32>,
    }

    fn parse_u32(s: &str) -> std::result::Result<u32, String> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed.map_err(|err| format!("`{s}`: {err}"))
    }

    fn parse_poke(s: &str) -> std::result::Result<(u32, u32), String> {
        let (addr, value) = s
            .split_once('=')
            .ok_or_else(|| format!("`{s}`: expected ADDR=VALUE"))?;
        Ok((parse_u32(addr)?, parse_u32(value)?))
    }

    fn list_cards(out: &mut impl Write) -> Result<()> {
        for opt in VME_SLOT_OPTIONS {
            writeln!(out, "{:<10} {}", opt.name, opt.description)?;
        }
        Ok(())
    }

    fn print_buses(machine: &Machine, out: &mut impl Write) -> Result<()> {
        for bus in machine.buses() {
            let Some(space) = bus.space() else {
                continue;
            };
            let space = space.borrow();
            writeln!(
                out,
                "{}: {} ({} bits)",
                bus.tag(),
                space.name(),
                space.data_width()
            )?;
            for card in machine.cards_on(bus.tag()) {
                writeln!(
                    out,
                    "  slot {:<2} {}",
                    card.interface().slot_number(),
                    card.name()
                )?;
            }
            for decoder in space.decoders() {
                writeln!(
                    out,
                    "  {:#010x}..={:#010x} {:<3} mask {:#010x}",
                    decoder.start,
                    decoder.end,
                    decoder.width.to_string(),
                    decoder.mask
                )?;
            }
        }
        Ok(())
    }

    pub fn main() -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();

        let args = Args::parse();
        let mut out = io::stdout().lock();

        if args.list_cards {
            return list_cards(&mut out);
        }
        let Some(path) = args.config.as_deref() else {
            bail!("--config is required");
        };
        for &(addr, value) in &args.poke {
            if value > args.width.max_value() {
                bail!(
                    "--poke {addr:#010x}={value:#x}: value does not fit a {:?} access",
                    args.width
                );
            }
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = MachineConfig::from_json(&json)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        let mut machine = Machine::from_config(&config).context("failed to compose machine")?;
        machine.start().context("start-up failed")?;
        tracing::info!(
            "started {} buses, {} slots",
            machine.buses().len(),
            machine.slots().len()
        );

        print_buses(&machine, &mut out)?;

        if args.poke.is_empty() && args.peek.is_empty() {
            return Ok(());
        }
        let space = machine
            .space(&args.bus)
            .with_context(|| format!("no bus `{}`", args.bus))?;
        let mut space = space.borrow_mut();

        for (addr, value) in args.poke {
            match args.width {
                Width::D8 => space.write8(addr, value as u8),
                Width::D16 => space.write16(addr, value as u16),
                Width::D32 => space.write32(addr, value),
            }
        }
        for addr in args.peek {
            match args.width {
                Width::D8 => writeln!(out, "{addr:#010x} = {:#04x}", space.read8(addr))?,
                Width::D16 => writeln!(out, "{addr:#010x} = {:#06x}", space.read16(addr))?,
                Width::D32 => writeln!(out, "{addr:#010x} = {:#010x}", space.read32(addr))?,
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}
