use rtrb::{Consumer, Producer, RingBuffer};

use super::{ChunkDecoder, ClientToServerMsg, ServerToClientMsg};
use crate::SERVER_WAIT_TIME;

pub(crate) struct DecodeServer<D: ChunkDecoder> {
    to_client_tx: Producer<ServerToClientMsg<D>>,
    from_client_rx: Consumer<ClientToServerMsg>,
    close_signal_rx: Consumer<()>,

    decoder: D,

    run: bool,
}

impl<D: ChunkDecoder> DecodeServer<D> {
    /// Spawn the decode server on its own thread.
    ///
    /// The decoder is constructed inside that thread; only the open result
    /// travels back.
    pub(crate) fn spawn(
        to_client_tx: Producer<ServerToClientMsg<D>>,
        from_client_rx: Consumer<ClientToServerMsg>,
        close_signal_rx: Consumer<()>,
        additional_opts: D::AdditionalOpts,
    ) -> Result<(), D::OpenError> {
        let (mut open_tx, mut open_rx) = RingBuffer::<Result<(), D::OpenError>>::new(1);

        std::thread::spawn(move || match D::new(additional_opts) {
            Ok(decoder) => {
                // Push cannot fail because only one message is ever sent.
                let _ = open_tx.push(Ok(()));

                DecodeServer::run(Self {
                    to_client_tx,
                    from_client_rx,
                    close_signal_rx,
                    decoder,
                    run: true,
                });
            }
            Err(e) => {
                // Push cannot fail because only one message is ever sent.
                let _ = open_tx.push(Err(e));
            }
        });

        loop {
            if let Ok(res) = open_rx.pop() {
                return res;
            }

            std::thread::sleep(SERVER_WAIT_TIME);
        }
    }

    fn run(mut self) {
        while self.run {
            // Check for close signal.
            if self.close_signal_rx.pop().is_ok() {
                break;
            }

            while let Ok(msg) = self.from_client_rx.pop() {
                match msg {
                    ClientToServerMsg::DecodeChunk {
                        payload,
                        start,
                        end,
                    } => {
                        let num_frames = end - start;

                        // Exactly one settle message is sent per request, on
                        // every path. A decoder error is not fatal to the
                        // server; the next request is serviced normally.
                        match self.decoder.decode_chunk(&payload, num_frames) {
                            Ok(frames) => {
                                log::debug!(
                                    "decoded chunk [{}, {}) into {} frame(s)",
                                    start,
                                    end,
                                    frames.len()
                                );

                                self.send_msg(ServerToClientMsg::DecodeRes { frames, start, end });
                            }
                            Err(error) => {
                                log::warn!("chunk [{}, {}) failed to decode: {}", start, end, error);

                                self.send_msg(ServerToClientMsg::DecodeFailed { error });
                            }
                        }
                    }
                }

                if !self.run {
                    break;
                }
            }

            if self.run {
                std::thread::sleep(SERVER_WAIT_TIME);
            }
        }
    }

    fn send_msg(&mut self, msg: ServerToClientMsg<D>) {
        // Block until the message can be sent.
        loop {
            if !self.to_client_tx.is_full() {
                break;
            }

            // Check for close signal to avoid waiting forever.
            if self.close_signal_rx.pop().is_ok() {
                self.run = false;
                break;
            }

            std::thread::sleep(SERVER_WAIT_TIME);
        }

        // Push will never fail because we made sure a slot is available in
        // the previous step (or the provider has closed, in which case an
        // error doesn't matter).
        let _ = self.to_client_tx.push(msg);
    }
}
