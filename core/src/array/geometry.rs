use serde::{Deserialize, Serialize};

/// Cartesian position of one microphone, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MicPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to an arbitrary point.
    pub fn distance_to(&self, x: f32, y: f32, z: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        let dz = self.z - z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Fixed microphone topology, supplied externally. The core never generates
/// or validates array shapes beyond the channel count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicArray {
    positions: Vec<MicPosition>,
}

impl MicArray {
    pub fn new(positions: Vec<MicPosition>) -> Self {
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, mic: usize) -> Option<&MicPosition> {
        self.positions.get(mic)
    }

    pub fn positions(&self) -> &[MicPosition] {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_matches_pythagoras() {
        let mic = MicPosition::new(0.0, 3.0, 0.0);
        assert!((mic.distance_to(4.0, 0.0, 0.0) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn array_indexing() {
        let array = MicArray::new(vec![
            MicPosition::new(0.0, 0.0, 0.0),
            MicPosition::new(0.1, 0.0, 0.0),
        ]);
        assert_eq!(array.len(), 2);
        assert_eq!(array.position(1).unwrap().x, 0.1);
        assert!(array.position(2).is_none());
    }
}
