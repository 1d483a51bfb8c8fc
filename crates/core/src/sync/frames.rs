/// Opaque identifier of a requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Source of per-frame callbacks (display refresh, timer or media event).
///
/// The host delivers a fired frame back through
/// [`Player::on_frame`](crate::Player::on_frame).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler whose frames are fired explicitly by the host.
#[derive(Debug, Default)]
pub struct ManualFrames {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, left in place.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Removes and returns the outstanding request so it can be fired.
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}
