use std::time::Duration;

/// EXIF-style orientation of the pixel buffer relative to the upright image.
///
/// The 90° variants mean the stored buffer is rotated, so the upright image
/// has width and height swapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    Left,
    LeftMirrored,
    Right,
    RightMirrored,
}

impl Orientation {
    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            Orientation::Left
                | Orientation::LeftMirrored
                | Orientation::Right
                | Orientation::RightMirrored
        )
    }
}

/// A single camera frame: contiguous pixel bytes in row-major order.
///
/// The capture core never inspects pixels; they are handed to the landmark
/// detector as-is together with the orientation and capture time.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    orientation: Orientation,
    timestamp: Duration,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            orientation: Orientation::Up,
            timestamp: Duration::ZERO,
        }
    }

    /// A frame with no pixel payload, for detectors that replay recorded results.
    pub fn empty(width: u32, height: u32, index: usize) -> Self {
        Self {
            data: Vec::new(),
            width,
            height,
            channels: 0,
            index,
            orientation: Orientation::Up,
            timestamp: Duration::ZERO,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Monotonic capture time, relative to the session clock.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Width and height of the upright image.
    pub fn oriented_size(&self) -> (u32, u32) {
        if self.orientation.is_rotated() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}
