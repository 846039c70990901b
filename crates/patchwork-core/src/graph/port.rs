//! Ports, their sample buffers and connection records.
//!
//! Every connection is stored twice: once in the source outlet (pointing at
//! the destination module and inlet) and once in the destination inlet
//! (pointing back at the source module and outlet). Records hold arena
//! indices, never references, so a connection never owns the module on the
//! other end.

use super::node::NodeId;

/// One side of a mirrored connection: the module and port on the far end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Module on the other end of the edge.
    pub module: NodeId,
    /// Port index on that module (an outlet index when stored in an inlet,
    /// an inlet index when stored in an outlet).
    pub port: usize,
}

/// An inlet or outlet: one block-length buffer plus its connection set.
///
/// The buffer is allocated once, when the owning module is added to a graph,
/// and reused for every cycle.
#[derive(Debug, Clone)]
pub struct Port {
    buffer: Vec<f32>,
    connections: Vec<Connection>,
}

impl Port {
    pub(crate) fn new(block_length: usize) -> Self {
        Self {
            buffer: vec![0.0; block_length],
            connections: Vec::new(),
        }
    }

    /// The port's sample buffer.
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    /// Connections attached to this port, in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns true if at least one connection is attached.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub(crate) fn contains(&self, connection: Connection) -> bool {
        self.connections.contains(&connection)
    }

    pub(crate) fn insert(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Removes the first matching record. Returns false if none was found.
    pub(crate) fn remove(&mut self, connection: Connection) -> bool {
        match self.connections.iter().position(|c| *c == connection) {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_connections(&mut self) {
        self.connections.clear();
    }

    /// Moves the buffer out, leaving an empty one in place (no allocation).
    pub(crate) fn take_buffer(&mut self) -> Vec<f32> {
        core::mem::take(&mut self.buffer)
    }

    pub(crate) fn restore_buffer(&mut self, buffer: Vec<f32>) {
        self.buffer = buffer;
    }
}

/// Adds `src` into `dst` sample by sample (mix/accumulate).
pub fn accumulate(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += *s;
    }
}

/// Copies as many samples as both slices hold from `src` into `dst`.
pub fn copy_prefix(dst: &mut [f32], src: &[f32]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_only_first_match() {
        let mut port = Port::new(4);
        let c = Connection {
            module: NodeId(1),
            port: 0,
        };
        port.insert(c);
        port.insert(c);
        assert!(port.remove(c));
        assert_eq!(port.connections().len(), 1);
        assert!(port.remove(c));
        assert!(!port.remove(c));
    }

    #[test]
    fn test_take_and_restore_keeps_samples() {
        let mut port = Port::new(3);
        port.buffer_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        let buffer = port.take_buffer();
        assert!(port.buffer().is_empty());
        port.restore_buffer(buffer);
        assert_eq!(port.buffer(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_accumulate_and_copy_prefix() {
        let mut dst = [1.0, 1.0, 1.0];
        accumulate(&mut dst, &[1.0, 2.0]);
        assert_eq!(dst, [2.0, 3.0, 1.0]);

        copy_prefix(&mut dst, &[9.0, 9.0, 9.0, 9.0]);
        assert_eq!(dst, [9.0, 9.0, 9.0]);
    }
}
