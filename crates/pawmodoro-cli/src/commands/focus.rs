use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use pawmodoro_core::timer::format_duration_label;
use pawmodoro_core::{
    ChannelSink, Config, EngineParts, Event, FocusRequest, FocusService, Phase, PetId, Preset,
    SystemClock,
};
use tokio::sync::mpsc;

use super::open_ledger;

const DEFAULT_NAME: &str = "Focus";
const DEFAULT_ICON: &str = "⏱️";
const BAR_WIDTH: usize = 24;

#[derive(Subcommand)]
pub enum FocusAction {
    /// Run a focus session in the foreground (Ctrl-C stops it without reward)
    Start {
        /// Preset name (see `focus presets`)
        preset: Option<String>,
        /// Session name
        #[arg(long)]
        name: Option<String>,
        /// Session icon
        #[arg(long)]
        icon: Option<String>,
        /// Duration such as "25m", "90s", "1h30m" or plain seconds
        #[arg(long)]
        duration: Option<String>,
        /// Pet to bring along (defaults to the active pet)
        #[arg(long)]
        pet: Option<String>,
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// List, add or remove timer presets
    Presets {
        #[command(subcommand)]
        action: Option<PresetAction>,
    },
}

#[derive(Subcommand)]
pub enum PresetAction {
    /// List configured presets (default)
    List,
    /// Create a custom timer
    Add {
        /// Preset name
        name: String,
        /// Duration such as "25m", "90s" or plain seconds
        #[arg(long)]
        duration: String,
        /// Icon shown next to the name
        #[arg(long, default_value = DEFAULT_ICON)]
        icon: String,
        /// Short description
        #[arg(long, default_value = "")]
        desc: String,
        /// Accent color as #RRGGBB
        #[arg(long, default_value = "")]
        color: String,
    },
    /// Delete a preset
    Remove {
        /// Preset name
        name: String,
    },
}

pub fn run(action: FocusAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        FocusAction::Start {
            preset,
            name,
            icon,
            duration,
            pet,
            json,
        } => {
            let config = Config::load_or_default();
            let request = build_request(&config, preset, name, icon, duration, pet)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_session(config, request, json))
        }
        FocusAction::Presets { action } => run_presets(action.unwrap_or(PresetAction::List)),
    }
}

fn run_presets(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PresetAction::List => {
            let config = Config::load_or_default();
            for preset in &config.presets {
                print!(
                    "{} {:<12} {:<14}",
                    preset.icon,
                    preset.name,
                    format_duration_label(preset.duration_secs)
                );
                if !preset.desc.is_empty() {
                    print!(" {}", preset.desc);
                }
                println!();
            }
        }
        PresetAction::Add {
            name,
            duration,
            icon,
            desc,
            color,
        } => {
            let mut config = Config::load()?;
            let preset = build_preset(name, &duration, icon, desc, color)?;
            let label = format_duration_label(preset.duration_secs);
            let name = preset.name.clone();
            config.add_preset(preset)?;
            config.save()?;
            println!("preset added: {name} ({label})");
        }
        PresetAction::Remove { name } => {
            let mut config = Config::load()?;
            let removed = config.remove_preset(&name)?;
            config.save()?;
            println!("preset removed: {}", removed.name);
        }
    }
    Ok(())
}

fn build_preset(
    name: String,
    duration: &str,
    icon: String,
    desc: String,
    color: String,
) -> Result<Preset, Box<dyn std::error::Error>> {
    let secs = parse_duration(duration)?;
    let duration_secs =
        u64::try_from(secs).map_err(|_| format!("duration must be positive: {duration}"))?;
    Ok(Preset::new(name, icon, duration_secs)
        .with_desc(desc)
        .with_color(color))
}

fn build_request(
    config: &Config,
    preset: Option<String>,
    name: Option<String>,
    icon: Option<String>,
    duration: Option<String>,
    pet: Option<String>,
) -> Result<FocusRequest, Box<dyn std::error::Error>> {
    let preset = match preset {
        Some(wanted) => Some(
            config
                .preset(&wanted)
                .ok_or_else(|| format!("unknown preset: {wanted}"))?,
        ),
        None => None,
    };

    let duration_secs = match (duration, preset) {
        (Some(raw), _) => parse_duration(&raw)?,
        (None, Some(p)) => i64::try_from(p.duration_secs)?,
        (None, None) => return Err("a preset or --duration is required".into()),
    };
    let name = name
        .or_else(|| preset.map(|p| p.name.clone()))
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let icon = icon
        .or_else(|| preset.map(|p| p.icon.clone()))
        .unwrap_or_else(|| DEFAULT_ICON.to_string());

    let mut request = FocusRequest::new(name, icon, duration_secs);
    if let Some(pet) = pet {
        request = request.with_pet(PetId::parse(&pet)?);
    }
    Ok(request)
}

/// Parse "90", "90s", "25m", "1h30m" into seconds.
fn parse_duration(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Ok(secs);
    }

    let invalid = || format!("invalid duration: {raw}");
    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let value: i64 = digits.parse().map_err(|_| invalid())?;
        total = value
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(invalid)?;
        digits.clear();
    }
    if !digits.is_empty() || raw.is_empty() {
        return Err(invalid());
    }
    Ok(total)
}

async fn run_session(
    config: Config,
    request: FocusRequest,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Arc::new(open_ledger(&config)?);
    let (sink, mut events) = ChannelSink::new(config.events.sink_capacity);
    let parts = EngineParts::new(Arc::new(SystemClock), ledger)
        .with_sink(Box::new(sink))
        .with_cadences(config.display_cadence(), config.frame_cadence());

    let handle = FocusService::spawn(parts)?;
    let signal = handle.stop_signal();
    handle.start(request).await?;

    // Fallback for a terminal event lost to a full sink.
    let mut watchdog = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                render(&event, json)?;
                if event.is_terminal() {
                    break;
                }
            }
            result = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if let Err(e) = result {
                    tracing::warn!("ctrl-c handler failed: {e}");
                }
                signal.trigger().await?;
            }
            _ = watchdog.tick() => {
                if handle.snapshot().await?.phase == Phase::Idle {
                    while let Ok(event) = events.try_recv() {
                        render(&event, json)?;
                    }
                    break;
                }
            }
        }
    }
    Ok(())
}

fn render(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    match event {
        Event::SessionStarted {
            name,
            icon,
            duration_label,
            ends_at,
            pet,
            ..
        } => {
            let ends_local = ends_at.with_timezone(&chrono::Local);
            write!(out, "{icon} {name} for {duration_label}, ends at {}", ends_local.format("%H:%M:%S"))?;
            if let Some(pet) = pet {
                write!(out, " with {pet}")?;
            }
            writeln!(out)?;
        }
        Event::Tick {
            remaining_formatted,
            progress,
            ..
        } => {
            write!(
                out,
                "\r{remaining_formatted:>8} [{}] {:>3}%",
                progress_bar(*progress, BAR_WIDTH),
                (progress * 100.0).floor() as u32
            )?;
        }
        Event::FrameAdvanced { .. } => {}
        Event::SessionCompleted {
            name,
            coins_earned,
            ..
        } => match coins_earned {
            Some(coins) => writeln!(out, "\n{name} complete: +{coins} coins")?,
            None => writeln!(out, "\n{name} complete, but the reward could not be saved")?,
        },
        Event::SessionStopped { name, elapsed_secs, .. } => {
            writeln!(
                out,
                "\n{name} stopped after {}, no coins earned",
                format_duration_label(elapsed_secs.floor() as u64)
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).floor() as usize).min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}
