//! Shared fixtures for integration tests

#![allow(dead_code)]

use hound::{WavSpec, WavWriter};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::id3::v2::Id3v2Tag;
use lofty::mp4::{Atom, AtomData, AtomIdent, Ilst};
use lofty::tag::{Accessor, TagExt};
use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Write a short 440 Hz stereo WAV
pub fn generate_test_wav(path: &Path, duration_secs: f32) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let num_samples = (duration_secs * spec.sample_rate as f32) as usize;

    for i in 0..num_samples {
        let t = i as f32 / spec.sample_rate as f32;
        let sample = ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3 * i16::MAX as f32) as i16;
        writer.write_sample(sample)?;
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Basic ID3v2 fields for a test file
pub struct TestTags<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub track: u32,
    pub track_total: u32,
}

/// Add an ID3v2 tag to an existing file
pub fn tag_file(path: &Path, tags: &TestTags<'_>) -> anyhow::Result<()> {
    let mut tagged_file = lofty::probe::Probe::open(path)?.read()?;

    let mut tag = Id3v2Tag::default();
    tag.set_title(tags.title.to_string());
    tag.set_artist(tags.artist.to_string());
    tag.set_album(tags.album.to_string());
    tag.set_track(tags.track);
    tag.set_track_total(tags.track_total);

    tagged_file.insert_tag(tag.into());
    tagged_file.save_to_path(path, WriteOptions::default())?;
    Ok(())
}

/// One canned HTTP route: requests whose path starts with `prefix` get this reply
pub struct CannedRoute {
    pub prefix: &'static str,
    pub status: u16,
    pub body: &'static str,
}

/// Serve canned replies on a local port; unmatched paths get a 404
///
/// Returns the base URL and a counter of requests served.
pub async fn serve_canned(routes: Vec<CannedRoute>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);
    let served = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&served);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let Ok(path) = read_request_path(&mut socket).await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let (status, body) = routes
                    .iter()
                    .find(|route| path.starts_with(route.prefix))
                    .map(|route| (route.status, route.body))
                    .unwrap_or((404, r#"{"error": "Not Found"}"#));
                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), served)
}

/// Read a full request (headers and body) and return its path
async fn read_request_path(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= header_end + 4 + content_length {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buf);
    Ok(request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string())
}

fn atom(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut atom = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    atom.extend_from_slice(fourcc);
    atom.extend_from_slice(payload);
    atom
}

/// Write a bare M4A skeleton: `ftyp` plus one sound track, no samples
///
/// Enough structure for tag readers; tags are added afterwards.
pub fn generate_test_m4a(path: &Path, duration_secs: u32) -> anyhow::Result<()> {
    const TIMESCALE: u32 = 44100;

    let mut ftyp = b"M4A ".to_vec();
    ftyp.extend_from_slice(&0u32.to_be_bytes());
    ftyp.extend_from_slice(b"M4A isom");

    let mut mdhd = vec![0u8; 4]; // version 0, flags
    mdhd.extend_from_slice(&0u32.to_be_bytes()); // creation time
    mdhd.extend_from_slice(&0u32.to_be_bytes()); // modification time
    mdhd.extend_from_slice(&TIMESCALE.to_be_bytes());
    mdhd.extend_from_slice(&(TIMESCALE * duration_secs).to_be_bytes());
    mdhd.extend_from_slice(&[0x55, 0xC4, 0, 0]); // language "und", quality

    let mut hdlr = vec![0u8; 8]; // version, flags, pre-defined
    hdlr.extend_from_slice(b"soun");
    hdlr.extend_from_slice(&[0u8; 12]);
    hdlr.push(0); // empty name

    let mut mdia = atom(b"mdhd", &mdhd);
    mdia.extend(atom(b"hdlr", &hdlr));
    let trak = atom(b"trak", &atom(b"mdia", &mdia));

    let mut file = atom(b"ftyp", &ftyp);
    file.extend(atom(b"moov", &trak));
    std::fs::write(path, file)?;
    Ok(())
}

/// Add an `ilst` tag with a title and freeform atoms to an M4A file
pub fn tag_m4a(
    path: &Path,
    title: &str,
    freeform: &[(&'static str, &'static str, &str)],
) -> anyhow::Result<()> {
    let mut ilst = Ilst::new();
    ilst.set_title(title.to_string());
    for (mean, name, value) in freeform {
        ilst.insert(Atom::new(
            AtomIdent::Freeform {
                mean: Cow::Borrowed(*mean),
                name: Cow::Borrowed(*name),
            },
            AtomData::UTF8(value.to_string()),
        ));
    }
    ilst.save_to_path(path, WriteOptions::default())?;
    Ok(())
}
