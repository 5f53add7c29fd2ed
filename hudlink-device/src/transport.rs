/// Byte source feeding the stream router, typically a USB CDC endpoint.
///
/// The router polls `available` and yields when it returns zero, so an
/// implementation never needs to block.
pub trait DeviceTransport {
    /// Bytes that can be read right now; zero lets the RX task yield.
    fn available(&mut self) -> usize;

    /// Read up to `dst.len()` bytes, returning the count actually read.
    fn read(&mut self, dst: &mut [u8]) -> usize;
}
