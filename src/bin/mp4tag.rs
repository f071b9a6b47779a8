use anyhow::Context;
use clap::{ArgAction, Parser};
use mp4tag::{CoverArt, Mp4File, Mp4Tag, TagField, TagValue};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Show or edit iTunes-style tags in MP4/M4A files")]
struct Args {
    /// MP4/M4A file path
    path: PathBuf,

    /// Write the result here instead of replacing the input file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit JSON instead of human-readable text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Remove every tag before applying the options below
    #[arg(long, action = ArgAction::SetTrue)]
    clear: bool,

    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    artist: Option<String>,
    #[arg(long)]
    album: Option<String>,
    #[arg(long)]
    album_artist: Option<String>,
    #[arg(long)]
    comments: Option<String>,
    #[arg(long)]
    composer: Option<String>,
    #[arg(long)]
    copyright: Option<String>,
    #[arg(long)]
    encoder: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    track: Option<u16>,
    #[arg(long)]
    track_total: Option<u16>,
    #[arg(long)]
    disc: Option<u16>,
    #[arg(long)]
    disc_total: Option<u16>,
    #[arg(long)]
    bpm: Option<u16>,

    /// Embed this image file as cover art (stored as-is)
    #[arg(long, conflicts_with = "remove_cover")]
    cover: Option<PathBuf>,

    /// Drop the embedded cover art
    #[arg(long, action = ArgAction::SetTrue)]
    remove_cover: bool,

    /// Log decisions taken while rewriting
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    tag: &'a Mp4Tag,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut file = Mp4File::open(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;

    let shown = edit_and_save(&args, &mut file)?;
    let report = Report { file: shown.display().to_string(), tag: file.tag() };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply the edits and save when there were any; returns the path to report.
fn edit_and_save(args: &Args, file: &mut Mp4File) -> anyhow::Result<PathBuf> {
    if !apply_edits(args, file.tag_mut())? {
        return Ok(args.path.clone());
    }
    let dest = args.output.clone().unwrap_or_else(|| args.path.clone());
    file.save_to_path(&dest)
        .with_context(|| format!("writing {}", dest.display()))?;
    Ok(dest)
}

/// Apply command-line edits; returns whether anything was requested.
fn apply_edits(args: &Args, tag: &mut Mp4Tag) -> anyhow::Result<bool> {
    let mut changed = false;
    if args.clear {
        tag.clear_all();
        changed = true;
    }

    let texts = [
        (TagField::Title, &args.title),
        (TagField::Artist, &args.artist),
        (TagField::Album, &args.album),
        (TagField::AlbumArtist, &args.album_artist),
        (TagField::Comments, &args.comments),
        (TagField::Composer, &args.composer),
        (TagField::Copyright, &args.copyright),
        (TagField::Encoder, &args.encoder),
        (TagField::Genre, &args.genre),
    ];
    for (field, value) in texts {
        if let Some(v) = value {
            set(tag, field, TagValue::Text(v.clone()))?;
            changed = true;
        }
    }

    let numbers = [
        (TagField::TrackNumber, args.track),
        (TagField::TrackTotal, args.track_total),
        (TagField::DiscNumber, args.disc),
        (TagField::DiscTotal, args.disc_total),
        (TagField::Bpm, args.bpm),
    ];
    for (field, value) in numbers {
        if let Some(n) = value {
            set(tag, field, TagValue::Number(n))?;
            changed = true;
        }
    }

    if let Some(year) = args.year {
        tag.set_year(year);
        changed = true;
    }

    if let Some(path) = &args.cover {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let cover = CoverArt::from_bytes(bytes);
        if cover.format().is_none() {
            anyhow::bail!("{}: unrecognized image format", path.display());
        }
        tag.set_cover_art(Some(cover));
        changed = true;
    }
    if args.remove_cover {
        tag.set_cover_art(None);
        changed = true;
    }

    Ok(changed)
}

fn set(tag: &mut Mp4Tag, field: TagField, value: TagValue) -> anyhow::Result<()> {
    tag.set(field, value)
        .map_err(|v| anyhow::anyhow!("value {:?} does not fit field {}", v, field))
}

fn print_human(report: &Report) {
    println!("File: {}", report.file);
    let tag = report.tag;
    if tag.is_empty() {
        println!("Tags: (none)");
        return;
    }

    println!("Tags:");
    for field in TagField::ALL {
        match tag.get(field) {
            TagValue::Text(s) if !s.is_empty() => println!("  {}: {}", field, s),
            TagValue::Number(n) if n != 0 => println!("  {}: {}", field, n),
            TagValue::Cover(Some(c)) => {
                let mime = c.format().map(|f| f.to_mime_type()).unwrap_or("unknown");
                println!("  {}: {} ({} bytes)", field, mime, c.bytes().len());
            }
            _ => {}
        }
    }
}
