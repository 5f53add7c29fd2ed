//! Common test doubles for the device stream layer.

use hudlink_device::DeviceTransport;

/// Serves a canned byte stream in bounded reads, so frames arrive split
/// across as many reads as the test wants.
pub struct ScriptTransport {
    data: Vec<u8>,
    pos: usize,
    max_read: usize,
}

impl ScriptTransport {
    pub fn new(data: Vec<u8>, max_read: usize) -> Self {
        assert!(max_read > 0);
        Self {
            data,
            pos: 0,
            max_read,
        }
    }

    #[allow(dead_code)]
    pub fn exhausted(&self) -> bool {
        self.pos == self.data.len()
    }
}

impl DeviceTransport for ScriptTransport {
    fn available(&mut self) -> usize {
        self.data.len() - self.pos
    }

    fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = (self.data.len() - self.pos).min(dst.len()).min(self.max_read);
        dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

/// Drive the router until the scripted stream is fully consumed.
#[allow(dead_code)]
pub fn drain(
    router: &hudlink_device::StreamRouter,
    transport: &mut ScriptTransport,
    cursor: &mut hudlink_device::RxCursor,
) {
    while router.poll(transport, cursor) > 0 {}
}
