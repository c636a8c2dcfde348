use std::{
    env, fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use trim_engine::{
    config::EditorConfig,
    decoder::{AutoDecoder, Decoder},
    export::trimmed_file_name,
    output::{AudioOutput, cpal_output::CpalOutput},
    session::EditorSession,
};
use transport::{
    clock::{MonotonicClock, SampleClock},
    timecode::format_time,
};

const PREVIEW_MARGIN: Duration = Duration::from_secs(2);
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Plays the selection once. Returns `Ok(false)` when `limit` ran out first.
///
/// The clock only moves while the device keeps calling back, so a stalled
/// stream would otherwise keep the loop alive forever.
fn preview<O: AudioOutput, C: MonotonicClock>(
    session: &mut EditorSession<O, C>,
    limit: Duration,
    interval: Duration,
) -> trim_engine::error::Result<bool> {
    let token = session.play()?;
    let deadline = Instant::now() + limit;
    while token.is_live() {
        if Instant::now() >= deadline {
            log::warn!("output stalled, ending preview");
            session.stop();
            return Ok(false);
        }
        thread::sleep(interval);
        session.tick();
    }
    Ok(true)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = env::args().collect::<Vec<_>>();
    let [_, input, start, end, rest @ ..] = args.as_slice() else {
        eprintln!("usage: trim_engine <input> <start-seconds> <end-seconds> [output.wav]");
        std::process::exit(2);
    };
    let start: f64 = start.parse()?;
    let end: f64 = end.parse()?;
    let output_path = rest.first().map_or_else(
        || {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_millis());
            PathBuf::from(trimmed_file_name(millis))
        },
        PathBuf::from,
    );

    let hint = Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let bytes = fs::read(input)?;
    let buffer = AutoDecoder::with_extension_hint(hint).decode(&bytes)?;

    // Playback time follows the frames the device has consumed.
    let clock = SampleClock::new(f64::from(buffer.sample_rate()));
    let mut session =
        EditorSession::new(CpalOutput::new(clock.clone()), clock, EditorConfig::default());
    session.load_buffer(buffer);

    session.set_trim_end(end);
    if !session.set_trim_start(start)? {
        log::warn!("start {start}s rejected, keeping {}s", session.current_time());
    }
    let Some(trim) = session.trim() else {
        return Err("no asset loaded".into());
    };
    log::info!(
        "selection {} - {} ({}), waveform {} columns",
        format_time(trim.start),
        format_time(trim.end),
        format_time(trim.duration()),
        session.summary().map_or(0, |s| s.width())
    );

    let limit = Duration::from_secs_f64(trim.duration()) + PREVIEW_MARGIN;
    if let Err(e) = preview(&mut session, limit, FRAME_INTERVAL) {
        log::warn!("skipping preview: {e}");
    }

    fs::write(&output_path, session.export()?)?;
    log::info!("wrote {}", output_path.display());
    Ok(())
}
