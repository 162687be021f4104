use zoetrope::{FrameProvider, ProviderOptions, Y4mDecoder};

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or("./demo.y4m".to_string());
    let frames_per_chunk: usize = std::env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(25);

    let data = std::fs::read(&path).expect("failed to read the input file");
    let chunks = split_chunks(&data, frames_per_chunk);
    println!(
        "{}: {} chunk(s) of up to {} frame(s)",
        path,
        chunks.len(),
        frames_per_chunk
    );

    let mut provider = FrameProvider::<Y4mDecoder>::new(ProviderOptions {
        capacity: 2,
        ..Default::default()
    })
    .unwrap();

    let mut start = 0;
    for (payload, num_frames) in chunks {
        let end = start + num_frames;

        provider.decode(payload, start, end).unwrap();
        provider.wait_until_idle().expect("decode failed");

        let probe = start + num_frames / 2;
        let info = provider
            .frame(probe)
            .map(|frame| format!("{}x{}", frame.width(), frame.height()))
            .unwrap_or("not cached".to_string());
        println!(
            "chunk [{}, {}): cached ranges {:?}, frame {} is {}",
            start,
            end,
            provider.cached_ranges(),
            probe,
            info
        );

        start = end;
    }
}

/// Split a y4m file into chunk payloads on FRAME boundaries. The first chunk
/// carries the stream header.
///
/// This scans for newline-preceded FRAME markers, which is good enough for a
/// demo but could in principle misfire on raw plane data that happens to
/// contain the marker bytes.
fn split_chunks(data: &[u8], frames_per_chunk: usize) -> Vec<(Vec<u8>, usize)> {
    const MARKER: &[u8] = b"FRAME";

    let mut offsets = Vec::new();
    for i in 1..data.len().saturating_sub(MARKER.len()) {
        if data[i - 1] == b'\n' && &data[i..i + MARKER.len()] == MARKER {
            offsets.push(i);
        }
    }

    let mut chunks = Vec::new();
    let mut begin = 0;
    let mut count = 0;
    for (i, &offset) in offsets.iter().enumerate() {
        if i != 0 && i % frames_per_chunk == 0 {
            chunks.push((data[begin..offset].to_vec(), count));
            begin = offset;
            count = 0;
        }
        count += 1;
    }
    if count > 0 {
        chunks.push((data[begin..].to_vec(), count));
    }

    chunks
}
