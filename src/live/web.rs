use async_trait::async_trait;
use futures::channel::{mpsc, oneshot};
use futures::stream::Stream;
use futures::StreamExt;
use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::{FrameStream, LiveError, Transport};

/// Frames buffered between the socket callbacks and the subscription.
const FRAME_BUFFER: usize = 32;

/// Browser WebSocket transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketTransport;

/// Closes the socket when the frame stream is dropped (view unmounted).
struct SocketGuard {
    socket: web_sys::WebSocket,
    // Held so the callbacks live exactly as long as the socket
    _onopen: Closure<dyn FnMut(web_sys::Event)>,
    _onmessage: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _onerror: Closure<dyn FnMut(web_sys::Event)>,
    _onclose: Closure<dyn FnMut(web_sys::CloseEvent)>,
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        self.socket.set_onclose(None);
        let _ = self.socket.close();
    }
}

struct SocketFrames {
    frames: mpsc::Receiver<Result<String, LiveError>>,
    _guard: SocketGuard,
}

impl Stream for SocketFrames {
    type Item = Result<String, LiveError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_next_unpin(cx)
    }
}

#[async_trait(?Send)]
impl Transport for WebSocketTransport {
    async fn connect(&self, url: &str) -> Result<FrameStream, LiveError> {
        let socket = web_sys::WebSocket::new(url)
            .map_err(|e| LiveError::Connect(format!("{:?}", e)))?;

        let (opened_tx, opened_rx) = oneshot::channel::<Result<(), LiveError>>();
        let opened_tx = Rc::new(RefCell::new(Some(opened_tx)));
        let (mut frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);

        let open_signal = opened_tx.clone();
        let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
            if let Some(tx) = open_signal.borrow_mut().take() {
                let _ = tx.send(Ok(()));
            }
        }) as Box<dyn FnMut(_)>);
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let mut message_tx = frames_tx.clone();
        let onmessage = Closure::wrap(Box::new(move |e: web_sys::MessageEvent| {
            match e.data().as_string() {
                Some(text) => {
                    // Callbacks cannot wait: a full buffer drops the frame
                    if let Err(e) = message_tx.try_send(Ok(text)) {
                        if e.is_full() {
                            tracing::warn!("Live frame buffer full, dropping frame");
                        }
                    }
                }
                None => tracing::warn!("Ignoring non-text live frame"),
            }
        }) as Box<dyn FnMut(_)>);
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        // An error before open fails the connect; after open it ends the stream
        let error_signal = opened_tx.clone();
        let mut error_tx = frames_tx.clone();
        let onerror = Closure::wrap(Box::new(move |_: web_sys::Event| {
            match error_signal.borrow_mut().take() {
                Some(tx) => {
                    let _ = tx.send(Err(LiveError::Connect("WebSocket error".into())));
                }
                None => {
                    let _ = error_tx.try_send(Err(LiveError::Transport("WebSocket error".into())));
                }
            }
        }) as Box<dyn FnMut(_)>);
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let close_signal = opened_tx;
        let onclose = Closure::wrap(Box::new(move |e: web_sys::CloseEvent| {
            if let Some(tx) = close_signal.borrow_mut().take() {
                let _ = tx.send(Err(LiveError::Connect(format!("closed with code {}", e.code()))));
            }
            frames_tx.close_channel();
        }) as Box<dyn FnMut(_)>);
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let guard = SocketGuard {
            socket,
            _onopen: onopen,
            _onmessage: onmessage,
            _onerror: onerror,
            _onclose: onclose,
        };

        match opened_rx.await {
            Ok(Ok(())) => Ok(SocketFrames {
                frames: frames_rx,
                _guard: guard,
            }
            .boxed_local()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LiveError::Connect("socket dropped before opening".into())),
        }
    }
}
