use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Default number of packets the buffer holds before overflowing.
pub const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Reading order over the oldest buffered packets.
///
/// `[0, 2, 1]` reads packet 0, then packet 2, then packet 1, then any newer
/// packets in arrival order. Indices beyond the number of buffered packets
/// are skipped, so an order always resolves to a permutation of whatever is
/// buffered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketOrder(Vec<usize>);

impl PacketOrder {
    /// Validate that `indices` is a permutation of `0..indices.len()`.
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        let mut seen = vec![false; indices.len()];
        for &index in &indices {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(FrameError::InvalidOrder(indices)),
            }
        }
        Ok(Self(indices))
    }

    /// Arrival order.
    pub fn natural() -> Self {
        Self(Vec::new())
    }

    /// Explicit arrival order over `len` packets.
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    /// This order with positions `a` and `b` exchanged.
    pub fn swapped(mut self, a: usize, b: usize) -> Self {
        let len = self.0.len().max(a.max(b) + 1);
        let start = self.0.len();
        self.0.extend(start..len);
        self.0.swap(a, b);
        self
    }

    pub fn is_natural(&self) -> bool {
        self.0.iter().enumerate().all(|(pos, &index)| pos == index)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    fn resolve(&self, count: usize) -> impl Iterator<Item = usize> + '_ {
        let tail = self.0.len().min(count)..count;
        self.0.iter().copied().filter(move |&i| i < count).chain(tail)
    }
}

/// FIFO of notification packets with a logical read head.
///
/// Packets are never copied on arrival and never mutated; consuming bytes
/// only slices the oldest packet or retires it.
#[derive(Debug)]
pub struct PacketBuffer {
    packets: VecDeque<Bytes>,
    capacity: usize,
    available: usize,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packets: VecDeque::with_capacity(capacity),
            capacity,
            available: 0,
        }
    }

    /// Append a packet. Empty packets are dropped.
    pub fn write(&mut self, packet: Bytes) -> Result<()> {
        if packet.is_empty() {
            return Ok(());
        }
        if self.packets.len() >= self.capacity {
            return Err(FrameError::BufferFull {
                capacity: self.capacity,
            });
        }
        self.available += packet.len();
        self.packets.push_back(packet);
        Ok(())
    }

    /// Copy up to `size` bytes from the head without consuming them.
    ///
    /// Returns fewer than `size` bytes when not enough are buffered.
    pub fn peek(&self, size: usize, order: Option<&PacketOrder>) -> Bytes {
        let mut out = BytesMut::with_capacity(size.min(self.available));
        for index in self.sequence(order) {
            let packet = &self.packets[index];
            let take = (size - out.len()).min(packet.len());
            out.extend_from_slice(&packet[..take]);
            if out.len() == size {
                break;
            }
        }
        out.freeze()
    }

    /// Consume one byte from the head.
    pub fn get_byte(&mut self) -> Result<u8> {
        let Some(front) = self.packets.front_mut() else {
            return Err(FrameError::EndOfBuffer {
                requested: 1,
                available: 0,
            });
        };
        let byte = front.get_u8();
        if front.is_empty() {
            self.packets.pop_front();
        }
        self.available -= 1;
        Ok(byte)
    }

    /// Consume `size` bytes read in `order`, as seen by a prior [`peek`].
    ///
    /// A non-natural order is committed first: the buffered packets are
    /// rearranged so later reads continue the reordered stream.
    ///
    /// [`peek`]: PacketBuffer::peek
    pub fn seek_forward(&mut self, size: usize, order: Option<&PacketOrder>) -> Result<()> {
        if size > self.available {
            return Err(FrameError::EndOfBuffer {
                requested: size,
                available: self.available,
            });
        }
        if let Some(order) = order.filter(|o| !o.is_natural()) {
            self.rearrange(order);
        }

        let mut remaining = size;
        while remaining > 0 {
            let Some(front) = self.packets.front_mut() else {
                break;
            };
            if front.len() <= remaining {
                remaining -= front.len();
                self.packets.pop_front();
            } else {
                front.advance(remaining);
                remaining = 0;
            }
        }
        self.available -= size;
        Ok(())
    }

    /// Remove one packet outright, losing its bytes.
    pub fn drop_packet(&mut self, index: usize) -> Option<Bytes> {
        let packet = self.packets.remove(index)?;
        self.available -= packet.len();
        Some(packet)
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered packets, oldest first.
    pub fn packets(&self) -> impl Iterator<Item = &Bytes> {
        self.packets.iter()
    }

    pub fn clear(&mut self) {
        self.packets.clear();
        self.available = 0;
    }

    fn sequence<'a>(&'a self, order: Option<&'a PacketOrder>) -> Box<dyn Iterator<Item = usize> + 'a> {
        match order {
            Some(order) => Box::new(order.resolve(self.packets.len())),
            None => Box::new(0..self.packets.len()),
        }
    }

    fn rearrange(&mut self, order: &PacketOrder) {
        let mut old: Vec<Bytes> = self.packets.drain(..).collect();
        let count = old.len();
        self.packets = order
            .resolve(count)
            .map(|index| std::mem::take(&mut old[index]))
            .collect();
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_of(packets: &[&'static [u8]]) -> PacketBuffer {
        let mut buffer = PacketBuffer::new();
        for packet in packets {
            buffer.write(Bytes::from_static(packet)).unwrap();
        }
        buffer
    }

    #[test]
    fn peek_spans_packets_without_consuming() {
        let buffer = buffer_of(&[b"ab", b"cde", b"f"]);
        assert_eq!(buffer.peek(4, None).as_ref(), b"abcd");
        assert_eq!(buffer.peek(10, None).as_ref(), b"abcdef");
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.packet_count(), 3);
    }

    #[test]
    fn get_byte_retires_empty_packets() {
        let mut buffer = buffer_of(&[b"a", b"bc"]);
        assert_eq!(buffer.get_byte().unwrap(), b'a');
        assert_eq!(buffer.packet_count(), 1);
        assert_eq!(buffer.get_byte().unwrap(), b'b');
        assert_eq!(buffer.get_byte().unwrap(), b'c');
        assert!(buffer.is_empty());
        assert!(matches!(
            buffer.get_byte(),
            Err(FrameError::EndOfBuffer { requested: 1, available: 0 })
        ));
    }

    #[test]
    fn seek_forward_truncates_partial_packet() {
        let mut buffer = buffer_of(&[b"ab", b"cde", b"f"]);
        buffer.seek_forward(3, None).unwrap();
        assert_eq!(buffer.packet_count(), 2);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.peek(3, None).as_ref(), b"def");
    }

    #[test]
    fn seek_forward_past_end_fails() {
        let mut buffer = buffer_of(&[b"ab"]);
        assert!(matches!(
            buffer.seek_forward(3, None),
            Err(FrameError::EndOfBuffer { requested: 3, available: 2 })
        ));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn capacity_overflow_is_buffer_full() {
        let mut buffer = PacketBuffer::with_capacity(2);
        buffer.write(Bytes::from_static(b"a")).unwrap();
        buffer.write(Bytes::from_static(b"b")).unwrap();
        let err = buffer.write(Bytes::from_static(b"c")).unwrap_err();
        assert!(matches!(err, FrameError::BufferFull { capacity: 2 }));
        buffer.write(Bytes::new()).unwrap();
    }

    #[test]
    fn peek_with_order_reads_permuted_packets() {
        let buffer = buffer_of(&[b"12", b"56", b"34", b"78"]);
        let order = PacketOrder::identity(3).swapped(1, 2);
        assert_eq!(order.indices(), [0, 2, 1]);
        assert_eq!(buffer.peek(8, Some(&order)).as_ref(), b"12345678");
        assert_eq!(buffer.peek(8, None).as_ref(), b"12563478");
    }

    #[test]
    fn seek_with_order_commits_the_permutation() {
        let mut buffer = buffer_of(&[b"12", b"56", b"34", b"78"]);
        let order = PacketOrder::identity(3).swapped(1, 2);
        buffer.seek_forward(5, Some(&order)).unwrap();
        assert_eq!(buffer.peek(3, None).as_ref(), b"678");
        assert_eq!(buffer.packet_count(), 2);
    }

    #[test]
    fn order_longer_than_buffer_is_clipped() {
        let buffer = buffer_of(&[b"ab"]);
        let order = PacketOrder::new(vec![2, 0, 1]).unwrap();
        assert_eq!(buffer.peek(2, Some(&order)).as_ref(), b"ab");
    }

    #[test]
    fn invalid_orders_are_rejected() {
        assert!(PacketOrder::new(vec![0, 0]).is_err());
        assert!(PacketOrder::new(vec![1, 2]).is_err());
        assert!(PacketOrder::new(vec![1, 0]).is_ok());
        assert!(PacketOrder::new(vec![0, 1, 2]).unwrap().is_natural());
    }

    #[test]
    fn drop_packet_removes_bytes() {
        let mut buffer = buffer_of(&[b"ab", b"cd"]);
        assert_eq!(buffer.drop_packet(0).unwrap().as_ref(), b"ab");
        assert_eq!(buffer.len(), 2);
        assert!(buffer.drop_packet(5).is_none());
    }
}
