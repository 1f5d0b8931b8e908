use anyhow::{bail, Context, Result};
use chordlab::playback::{
    Channel, EventType, MonotonicClock, PlaybackNotification, Player, Recording,
};
use chordlab::{
    chord_notes, chord_notes_as_midi, identify_all, midi_to_name, parse_progression, scale_notes,
    suggest, DocumentStore, LeadSheet, PitchClass, PracticeConfig, ProgressionDocument, ScaleKind,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "chordlab", about = "Piano practice toolkit: scales, chords, progressions and MIDI playback")]
#[command(version)]
struct Cli {
    /// Practice configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the notes of a scale
    Scale { root: String, kind: String },

    /// List the notes of a chord, with a MIDI voicing
    Chord {
        root: String,
        kind: String,
        #[arg(long, default_value_t = 0)]
        inversion: i32,
        /// Base octave; defaults to the configured one
        #[arg(long)]
        octave: Option<i32>,
    },

    /// Name every chord spelled by the given MIDI notes
    Identify {
        #[arg(required = true)]
        notes: Vec<u8>,
    },

    /// Suggest chords the given MIDI notes partially spell
    Suggest {
        #[arg(required = true)]
        notes: Vec<u8>,
    },

    /// Parse a progression string or a lead-sheet file
    Parse {
        /// Progression text, e.g. "C | Am | F | G"
        progression: Option<String>,
        /// Lead-sheet file with optional YAML front-matter
        #[arg(long, conflicts_with = "progression")]
        file: Option<PathBuf>,
        /// Key for Roman numerals; overrides the configured key
        #[arg(long)]
        key: Option<String>,
        /// Scale for Roman numerals; overrides the configured scale
        #[arg(long)]
        scale: Option<String>,
    },

    /// Play a recording document, printing notes as they sound
    Play {
        file: PathBuf,
        #[arg(long)]
        rate: Option<f64>,
        /// Repeat until interrupted
        #[arg(long = "loop")]
        looping: bool,
    },

    /// Check a recording or progression document
    Validate { file: PathBuf },

    /// Validate a document and copy it into the configured storage-dir
    Import { file: PathBuf },

    /// List stored recordings and progressions, newest first
    List,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PracticeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PracticeConfig::default(),
    };

    match cli.command {
        Command::Scale { root, kind } => {
            let notes = scale_notes(&root, &kind);
            if notes.is_empty() {
                bail!("unknown scale: {} {}", root, kind);
            }
            println!("{}", notes.join(" "));
        }
        Command::Chord {
            root,
            kind,
            inversion,
            octave,
        } => {
            let notes = chord_notes(&root, &kind);
            if notes.is_empty() {
                bail!("unknown chord: {} {}", root, kind);
            }
            let octave = octave.unwrap_or(config.base_octave);
            let midi = chord_notes_as_midi(&root, &kind, inversion, octave);
            println!("{}", notes.join(" "));
            println!("{}", format_midi(&midi));
        }
        Command::Identify { notes } => {
            let found = identify_all(&notes);
            if found.is_empty() {
                println!("No chord");
            }
            for id in found {
                println!("{} ({})", id.display_name, id.inversion);
            }
        }
        Command::Suggest { notes } => {
            for s in suggest(&notes) {
                let missing: Vec<_> = s.missing.iter().map(|p| p.name()).collect();
                println!("{} (add {})", s.display_name, missing.join(" "));
            }
        }
        Command::Parse {
            progression,
            file,
            key,
            scale,
        } => {
            let result = match (file, progression) {
                (Some(path), _) => {
                    let source = read(&path)?;
                    let mut sheet = LeadSheet::parse(&source)?;
                    if let Some(key) = key {
                        sheet.key = Some(parse_key(&key)?);
                    }
                    if let Some(scale) = scale {
                        sheet.scale = parse_scale(&scale)?;
                    }
                    if let Some(title) = &sheet.title {
                        println!("{}", title);
                    }
                    sheet.resolve()
                }
                (None, Some(text)) => {
                    let root = match key {
                        Some(key) => Some(parse_key(&key)?),
                        None => config.key,
                    };
                    let kind = match scale {
                        Some(scale) => parse_scale(&scale)?,
                        None => config.scale,
                    };
                    let context = root.map(|r| kind.notes(r));
                    parse_progression(&text, context.as_deref())
                }
                (None, None) => bail!("give a progression or --file"),
            };
            if let Some(error) = result.error {
                bail!(error);
            }
            for step in &result.chords {
                let midi = chordlab::voice_step(step, config.base_octave);
                println!("{:<8} {:<16} {}", step.symbol, step.name, format_midi(&midi));
            }
        }
        Command::Play {
            file,
            rate,
            looping,
        } => {
            let recording = Recording::from_json(&read(&file)?)
                .with_context(|| format!("loading {}", file.display()))?;
            play(recording, rate.unwrap_or(config.playback.rate), looping || config.playback.looping)?;
        }
        Command::Validate { file } => {
            let text = read(&file)?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;
            if is_recording(&value) {
                let rec = Recording::from_value(&value)?;
                println!(
                    "Valid recording '{}': {} events ({} notes), {:.0} ms",
                    rec.name,
                    rec.events.len(),
                    rec.note_count(),
                    rec.duration_ms
                );
            } else {
                let doc = ProgressionDocument::from_value(&value)?;
                println!("Valid progression '{}': {}", doc.name, doc.progression);
            }
        }
        Command::Import { file } => {
            let dir = storage_dir(&config)?;
            let text = read(&file)?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;
            let id = if is_recording(&value) {
                DocumentStore::<Recording>::open(dir.join("recordings"))?.import(&text)?.id
            } else {
                DocumentStore::<ProgressionDocument>::open(dir.join("progressions"))?
                    .import(&text)?
                    .id
            };
            println!("Imported {}", id);
        }
        Command::List => {
            let dir = storage_dir(&config)?;
            for rec in DocumentStore::<Recording>::open(dir.join("recordings"))?.list()? {
                println!("recording   {}  {} ({:.0} ms)", rec.id, rec.name, rec.duration_ms);
            }
            for doc in DocumentStore::<ProgressionDocument>::open(dir.join("progressions"))?.list()? {
                println!("progression {}  {}: {}", doc.id, doc.name, doc.progression);
            }
        }
    }
    Ok(())
}

fn is_recording(value: &Value) -> bool {
    value.get("events").is_some()
}

fn storage_dir(config: &PracticeConfig) -> Result<&Path> {
    match &config.storage_dir {
        Some(dir) => Ok(dir.as_path()),
        None => bail!("no storage-dir configured; pass --config with a storage-dir"),
    }
}

fn play(recording: Recording, rate: f64, looping: bool) -> Result<()> {
    println!(
        "Playing '{}' ({} events, {:.0} ms) at {}x",
        recording.name,
        recording.events.len(),
        recording.duration_ms,
        rate
    );
    let mut player = Player::new(MonotonicClock::new());
    player.on(Channel::Event, |n| {
        if let PlaybackNotification::Event(e) = n {
            let action = match e.kind {
                EventType::NoteOn => "on ",
                EventType::NoteOff => "off",
            };
            println!("{} {:<4} vel {:<3} ch {}", action, midi_to_name(e.note), e.velocity, e.channel);
        }
    });
    player.on(Channel::Complete, |n| {
        if let PlaybackNotification::Complete(c) = n {
            println!("Done: {} events", c.total_events);
        }
    });
    player.on(Channel::Stop, |n| {
        if let PlaybackNotification::Stop { reason } = n {
            eprintln!("Stopped: {:?}", reason);
        }
    });
    player.load_recording(recording)?;
    player.set_playback_rate(rate)?;
    player.set_loop(looping);
    player.play()?;
    player.run(|ms| thread::sleep(Duration::from_secs_f64(ms / 1000.0)));
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn parse_key(key: &str) -> Result<PitchClass> {
    PitchClass::from_name(key).with_context(|| format!("invalid key: {}", key))
}

fn parse_scale(scale: &str) -> Result<&'static ScaleKind> {
    ScaleKind::from_id(scale).with_context(|| format!("invalid scale: {}", scale))
}

fn format_midi(midi: &[u8]) -> String {
    let names: Vec<_> = midi
        .iter()
        .map(|&n| format!("{}({})", midi_to_name(n), n))
        .collect();
    names.join(" ")
}
