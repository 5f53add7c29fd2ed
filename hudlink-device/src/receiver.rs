use hudlink_proto::FrameHeader;

/// Why a frame was discarded before reaching a receiver's `commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No receiver is registered for the frame's magic.
    NoReceiver,
    /// Payload length is zero or beyond the receiver's cap.
    BadLen,
    /// CRC required but the header value is zero or mismatched.
    BadCrc,
    /// The receiver had no free buffer.
    NoBuffer,
}

/// Mutable view into receiver-owned payload storage, loaned to the router
/// for the duration of one frame.
///
/// The token names the receiver's internal slot and travels back through
/// [`FrameReceiver::commit`] or [`FrameReceiver::abort`]; the router never
/// interprets it.
pub struct RxGrant<'a> {
    buf: &'a mut [u8],
    token: u32,
}

impl<'a> RxGrant<'a> {
    pub fn new(buf: &'a mut [u8], token: u32) -> Self {
        Self { buf, token }
    }

    pub fn token(&self) -> u32 {
        self.token
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn as_mut(&mut self) -> &mut [u8] {
        self.buf
    }
}

/// A frame consumer registered with the stream router.
///
/// The router parses and validates headers, then moves payload bytes
/// straight into receiver-owned storage: `acquire` loans a buffer,
/// `commit` finishes a validated frame, `abort` returns the loan after a
/// late failure, and `reject` reports failures that happen before any
/// buffer was loaned.
pub trait FrameReceiver: Send + Sync {
    /// Channel magic this receiver consumes.
    fn magic(&self) -> u32;

    /// Hard cap for payload length.
    fn max_len(&self) -> usize;

    /// Require a matching, non-zero payload CRC before `commit`.
    fn require_crc(&self) -> bool;

    /// Loan a buffer for an incoming frame, or `None` to drop it.
    fn acquire(&self, header: &FrameHeader) -> Option<RxGrant<'_>>;

    /// The payload was fully received (and CRC-checked when required).
    fn commit(&self, header: &FrameHeader, grant: RxGrant<'_>, len: usize);

    /// The frame failed after `acquire`.
    fn abort(&self, grant: RxGrant<'_>, reason: DropReason);

    /// The frame failed before `acquire`.
    fn reject(&self, header: &FrameHeader, reason: DropReason);
}
