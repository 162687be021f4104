use std::collections::HashMap;

use rtrb::{Consumer, Producer, RingBuffer};

use super::{
    ChunkDecoder, ChunkStore, ClientToServerMsg, DecodeError, DecodeServer, ProviderOptions,
    ServerToClientMsg, SourceMode,
};
use crate::{Bitmap, SERVER_WAIT_TIME};

/// Turns compressed chunk payloads into individually addressable decoded
/// frames.
///
/// Decoding runs on a dedicated server thread that owns the persistent
/// decoder. The provider keeps the frame cache and the range bookkeeping on
/// the caller's side: [`decode`] dispatches a chunk and returns immediately,
/// [`frame`] and [`cached_ranges`] never block, and [`wait_until_idle`]
/// awaits the outcome of the in-flight decode.
///
/// At most one decode is in flight per provider. A second request while one
/// is running fails fast with [`DecodeError::DecodeInProgress`]; nothing is
/// queued.
///
/// [`decode`]: FrameProvider::decode
/// [`frame`]: FrameProvider::frame
/// [`cached_ranges`]: FrameProvider::cached_ranges
/// [`wait_until_idle`]: FrameProvider::wait_until_idle
pub struct FrameProvider<D: ChunkDecoder> {
    to_server_tx: Producer<ClientToServerMsg>,
    from_server_rx: Consumer<ServerToClientMsg<D>>,
    close_signal_tx: Producer<()>,

    cache: HashMap<usize, Bitmap>,
    store: ChunkStore,

    in_flight: Option<(usize, usize)>,
    settled_error: Option<DecodeError<D::DecodeError>>,
}

impl<D: ChunkDecoder> FrameProvider<D> {
    /// Open a new frame provider.
    ///
    /// This spawns the decode server thread and constructs the decoder on
    /// it.
    ///
    /// # Panics
    ///
    /// Panics if `options.capacity` or `options.server_msg_channel_size` is
    /// zero.
    pub fn new(options: ProviderOptions<D>) -> Result<FrameProvider<D>, D::OpenError> {
        assert_ne!(options.capacity, 0);
        assert_ne!(options.server_msg_channel_size, Some(0));

        // One in-flight request plus its settle message is all that ever
        // lives in a channel, but reserve a little extra space.
        let msg_channel_size = options.server_msg_channel_size.unwrap_or(8);

        let (to_server_tx, from_client_rx) =
            RingBuffer::<ClientToServerMsg>::new(msg_channel_size);
        let (to_client_tx, from_server_rx) =
            RingBuffer::<ServerToClientMsg<D>>::new(msg_channel_size);

        // Create dedicated close signal.
        let (close_signal_tx, close_signal_rx) = RingBuffer::<()>::new(1);

        DecodeServer::spawn(
            to_client_tx,
            from_client_rx,
            close_signal_rx,
            options.additional_opts,
        )?;

        Ok(Self {
            to_server_tx,
            from_server_rx,
            close_signal_tx,
            cache: HashMap::new(),
            store: ChunkStore::new(options.capacity),
            in_flight: None,
            settled_error: None,
        })
    }

    /// Look up the decoded frame with the given number.
    ///
    /// Returns `None` if the frame is not cached. This is a normal result,
    /// not an error: it distinguishes "not yet decoded" from "decode failed"
    /// (the latter surfaces from [`wait_until_idle`]). This never blocks and
    /// never triggers decoding.
    ///
    /// [`wait_until_idle`]: FrameProvider::wait_until_idle
    pub fn frame(&mut self, number: usize) -> Option<&Bitmap> {
        self.poll();

        self.cache.get(&number)
    }

    /// Dispatch a chunk payload covering frames `[start, end)` to the decode
    /// server.
    ///
    /// This returns as soon as the request is dispatched. The outcome is
    /// picked up by any later call on this provider; [`wait_until_idle`]
    /// reports it.
    ///
    /// Fails fast with [`DecodeError::DecodeInProgress`] if a decode is
    /// already in flight: requests are never queued, and it is the caller's
    /// job to serialize them. An empty range (`start == end`) succeeds
    /// without decoding or recording anything.
    ///
    /// [`wait_until_idle`]: FrameProvider::wait_until_idle
    pub fn decode(
        &mut self,
        payload: Vec<u8>,
        start: usize,
        end: usize,
    ) -> Result<(), DecodeError<D::DecodeError>> {
        self.poll();

        if self.in_flight.is_some() {
            return Err(DecodeError::DecodeInProgress);
        }
        if start > end {
            return Err(DecodeError::InvalidRange { start, end });
        }

        // A settled failure the caller never picked up is superseded by the
        // new request.
        self.settled_error = None;

        if start == end {
            return Ok(());
        }

        if self.to_server_tx.is_full() {
            return Err(DecodeError::ServerChannelFull);
        }

        // Push cannot fail because we checked for a free slot above.
        let _ = self.to_server_tx.push(ClientToServerMsg::DecodeChunk {
            payload,
            start,
            end,
        });
        self.in_flight = Some((start, end));

        Ok(())
    }

    /// Whether a decode is currently in flight.
    pub fn is_decoding(&mut self) -> bool {
        self.poll();

        self.in_flight.is_some()
    }

    /// Block until the in-flight decode (if any) settles, and return its
    /// outcome.
    ///
    /// After this returns, a new [`decode`] call is always accepted,
    /// regardless of whether the previous one succeeded or failed.
    ///
    /// [`decode`]: FrameProvider::decode
    pub fn wait_until_idle(&mut self) -> Result<(), DecodeError<D::DecodeError>> {
        loop {
            self.poll();

            if self.in_flight.is_none() {
                return match self.settled_error.take() {
                    Some(e) => Err(e),
                    None => Ok(()),
                };
            }

            std::thread::sleep(SERVER_WAIT_TIME);
        }
    }

    /// The currently cached ranges as `"start:end"` descriptors, ascending
    /// by start frame.
    pub fn cached_ranges(&mut self) -> Vec<String> {
        self.poll();

        self.store
            .ranges()
            .map(|(start, end)| format!("{}:{}", start, end))
            .collect()
    }

    /// Which source representation this provider serves.
    pub fn mode(&self) -> SourceMode {
        D::MODE
    }

    /// Apply any settled decode results sent from the server.
    ///
    /// The in-flight flag clears on either settle variant, so the provider
    /// always returns to idle.
    fn poll(&mut self) {
        while let Ok(msg) = self.from_server_rx.pop() {
            match msg {
                ServerToClientMsg::DecodeRes { frames, start, end } => {
                    self.in_flight = None;

                    let expected = end - start;
                    if frames.len() != expected {
                        self.settled_error = Some(DecodeError::FrameCountMismatch {
                            expected,
                            actual: frames.len(),
                        });
                        continue;
                    }

                    self.commit(frames, start, end);
                }
                ServerToClientMsg::DecodeFailed { error } => {
                    self.in_flight = None;
                    self.settled_error = Some(DecodeError::Decoder(error));
                }
            }
        }
    }

    /// Commit a fully decoded batch: insert every frame, record the range,
    /// and evict the oldest range once over capacity.
    fn commit(&mut self, frames: Vec<Bitmap>, start: usize, end: usize) {
        for (i, frame) in frames.into_iter().enumerate() {
            self.cache.insert(start + i, frame);
        }

        self.store.record_range(start, end);

        if let Some((evicted_start, evicted_end)) = self.store.evict_if_needed() {
            for number in evicted_start..evicted_end {
                self.cache.remove(&number);
            }
        }
    }
}

impl<D: ChunkDecoder> Drop for FrameProvider<D> {
    fn drop(&mut self) {
        // Tell the server to shut down.
        // This cannot fail because this is the only place the signal is ever
        // sent.
        let _ = self.close_signal_tx.push(());
    }
}
