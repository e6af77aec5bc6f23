use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use bytes::Bytes;
use scene_common::{
    coordinates::AxisConvention, protocol::ServerMessage, scene::CompiledScene,
    transform::Transform, ContentHash,
};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::{
    dirty::DirtySet,
    publication::{encode, Publication},
};
use crate::ServerError;

type Frame = Arc<str>;

/// Shared state of the web backend: the published scene, the latest pose of
/// every moved object, pending updates and the synced clients.
///
/// The driver writes through [`SyncState::update_transform`], the flush loop
/// drains through [`SyncState::flush`] and connection handlers register
/// through [`SyncState::connect`]. All of them serialize on one lock.
pub struct SyncState {
    convention: AxisConvention,
    hidden_groups: Vec<i32>,
    inner: Mutex<SyncInner>,
    /// Mirrors `SyncInner::publication` for readers that must not wait on the
    /// lock, and wakes handlers waiting for the first compile.
    published: watch::Sender<Option<Arc<Publication>>>,
}

#[derive(Default)]
struct SyncInner {
    publication: Option<Arc<Publication>>,
    current: HashMap<String, Transform>,
    dirty: DirtySet,
    clients: Vec<ClientHandle>,
}

struct ClientHandle {
    id: Uuid,
    sender: mpsc::UnboundedSender<Frame>,
    closed: Arc<AtomicBool>,
}

impl ClientHandle {
    fn send(&self, frame: Frame) -> bool {
        !self.closed.load(Ordering::Acquire) && self.sender.send(frame).is_ok()
    }

    fn send_all(&self, frames: &[Frame]) -> bool {
        frames.iter().all(|frame| self.send(frame.clone()))
    }

    fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.sender.is_closed()
    }
}

/// The receiving end of a synced client. Frames come out in the order the
/// server queued them. Dropping the session marks the client as closed, it is
/// removed on the next flush.
pub struct ClientSession {
    id: Uuid,
    frames: mpsc::UnboundedReceiver<Frame>,
    closed: Arc<AtomicBool>,
}

impl ClientSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `None` once the server dropped this client.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.frames.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Frame> {
        self.frames.try_recv().ok()
    }

    /// A failed send on the transport lands here.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl SyncState {
    pub fn new(convention: AxisConvention, hidden_groups: Vec<i32>) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            convention,
            hidden_groups,
            inner: Mutex::new(SyncInner::default()),
            published,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `scene` the current scene. Clients that are already synced get a
    /// fresh handshake, so nobody mixes objects of two compiles.
    pub fn publish(&self, scene: Arc<CompiledScene>) -> Result<(), ServerError> {
        let publication = Arc::new(Publication::new(
            scene,
            self.convention,
            &self.hidden_groups,
        )?);

        let mut inner = self.lock();
        let replaced = inner.publication.replace(publication.clone()).is_some();
        inner.current.clear();
        inner.dirty.clear();

        if !inner.clients.is_empty() {
            let frames = publication.handshake(&inner.current)?;
            inner.clients.retain(|client| client.send_all(&frames));
        }
        self.published.send_replace(Some(publication.clone()));

        if replaced {
            log::info!(
                "Replaced scene with {}, resynced {} clients",
                publication.id(),
                inner.clients.len()
            );
        } else {
            log::info!("Published scene {}", publication.id());
        }
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.published.borrow().is_some()
    }

    pub fn scene_id(&self) -> Option<ContentHash> {
        self.published
            .borrow()
            .as_ref()
            .map(|publication| publication.id())
    }

    /// Looks up an asset of the current scene without touching the lock.
    pub fn asset(&self, key: &str) -> Option<Bytes> {
        self.published
            .borrow()
            .as_ref()
            .and_then(|publication| publication.asset(key))
    }

    /// Records a new local pose for `name`. Nothing is sent until the next flush.
    pub fn update_transform(&self, name: &str, transform: Transform) -> Result<(), ServerError> {
        let mut inner = self.lock();
        let known = inner
            .publication
            .as_ref()
            .is_some_and(|publication| publication.contains_body(name));
        if !known {
            return Err(ServerError::UnknownObject(name.to_string()));
        }
        inner.current.insert(name.to_string(), transform);
        inner.dirty.mark(name, transform);
        Ok(())
    }

    /// Sends everything marked since the last flush as one `UPDATE_TRANSFORM`
    /// to every synced client and drops clients that are gone. Returns the
    /// number of objects sent.
    pub fn flush(&self) -> Result<usize, ServerError> {
        let mut inner = self.lock();
        let before = inner.clients.len();

        let sent = match inner.publication.clone() {
            Some(publication) if !inner.dirty.is_empty() => {
                let updates: BTreeMap<_, _> = inner
                    .dirty
                    .take()
                    .into_iter()
                    .map(|(name, transform)| {
                        let wire = publication.wire_transform(&transform);
                        (name, wire)
                    })
                    .collect();
                let count = updates.len();
                let frame = encode(&ServerMessage::UpdateTransform(updates))?;
                inner.clients.retain(|client| client.send(frame.clone()));
                count
            }
            _ => {
                inner.clients.retain(ClientHandle::is_alive);
                0
            }
        };

        let dropped = before - inner.clients.len();
        if dropped > 0 {
            log::info!("Dropped {dropped} disconnected clients");
        }
        if sent > 0 {
            log::debug!("Flushed {sent} transforms to {} clients", inner.clients.len());
        }
        Ok(sent)
    }

    /// Waits until a scene is published, then queues the handshake and adds
    /// the client to the synced list in one step.
    pub async fn connect(&self) -> Result<ClientSession, ServerError> {
        let mut ready = self.published.subscribe();
        // The sender lives as long as `self`.
        let _ = ready.wait_for(|publication| publication.is_some()).await;
        self.join()
    }

    fn join(&self) -> Result<ClientSession, ServerError> {
        let (sender, frames) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let id = Uuid::new_v4();

        let mut inner = self.lock();
        // Without a publication the client still gets its handshake once one
        // is published.
        if let Some(publication) = inner.publication.clone() {
            for frame in publication.handshake(&inner.current)? {
                // The receiver is still in hand, so this cannot fail.
                let _ = sender.send(frame);
            }
        }
        inner.clients.push(ClientHandle {
            id,
            sender,
            closed: closed.clone(),
        });
        log::info!("Client {id} synced, {} connected", inner.clients.len());

        Ok(ClientSession { id, frames, closed })
    }

    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn client_ids(&self) -> Vec<Uuid> {
        self.lock().clients.iter().map(|client| client.id).collect()
    }

    pub fn pending_updates(&self) -> usize {
        self.lock().dirty.len()
    }
}
