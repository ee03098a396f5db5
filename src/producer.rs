//! Background frame producer.
//!
//! Decodes, fits and quantizes every frame in order on its own thread and
//! admits the results to the [`FrameQueue`]. The thread's result is the error
//! channel back to the playback driver.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, trace};

use crate::error::{PlayError, Result};
use crate::loader::{load_frame, GridSize};
use crate::quantize::{quantize, BucketGrid};
use crate::queue::FrameQueue;

/// Closes the queue when the producer exits for any reason, including a
/// panic, so the renderer is never left waiting on frames that will not come.
struct CloseOnExit(Arc<FrameQueue<BucketGrid>>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Produces every frame in `files` into `queue`, blocking whenever the
/// renderer is a full lookahead behind. Stops quietly if the queue is closed
/// by the consumer; stops with an error on the first frame that fails to
/// decode.
pub fn produce_frames(files: &[PathBuf], bounds: GridSize, queue: &FrameQueue<BucketGrid>) -> Result<usize> {
    for (index, path) in files.iter().enumerate() {
        if queue.is_closed() {
            debug!("producer cancelled before frame {}", index);
            return Ok(index);
        }
        let img = load_frame(path, index, bounds)?;
        let grid = quantize(&img);
        trace!("produced frame {} ({}x{})", index, grid.width(), grid.height());
        if queue.admit(index, grid).is_err() {
            debug!("producer cancelled at frame {}", index);
            return Ok(index);
        }
    }
    Ok(files.len())
}

/// Starts [`produce_frames`] on a dedicated thread.
pub fn spawn_producer(
    files: Vec<PathBuf>,
    bounds: GridSize,
    queue: Arc<FrameQueue<BucketGrid>>,
) -> Result<JoinHandle<Result<usize>>> {
    thread::Builder::new()
        .name("frame-producer".into())
        .spawn(move || {
            let _close = CloseOnExit(Arc::clone(&queue));
            let produced = produce_frames(&files, bounds, &queue)?;
            info!("producer finished after {} frames", produced);
            Ok(produced)
        })
        .map_err(PlayError::Spawn)
}

/// Waits for the producer thread and turns a panic into an error.
pub fn join_producer(handle: JoinHandle<Result<usize>>) -> Result<usize> {
    handle.join().map_err(|_| PlayError::ProducerPanicked)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::time::Duration;

    fn write_frames(dir: &std::path::Path, shades: &[u8]) -> Vec<PathBuf> {
        shades
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let path = dir.join(format!("{}.png", i + 1));
                RgbImage::from_pixel(2, 2, Rgb([v, v, v])).save(&path).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn frames_arrive_in_order_as_bucket_grids() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_frames(dir.path(), &[0, 128, 255]);
        let queue = Arc::new(FrameQueue::new(8));

        let handle = spawn_producer(files, GridSize::new(2, 2), Arc::clone(&queue)).unwrap();
        let grids: Vec<_> = (0..3).map(|_| queue.take(Some(Duration::from_secs(5))).unwrap().rows()).collect();
        assert_eq!(join_producer(handle).unwrap(), 3);

        assert_eq!(grids[0], vec![vec![0, 0], vec![0, 0]]);
        assert_eq!(grids[1], vec![vec![2, 2], vec![2, 2]]);
        assert_eq!(grids[2], vec![vec![4, 4], vec![4, 4]]);
        assert!(queue.is_closed());
    }

    #[test]
    fn decode_failure_closes_the_queue_and_reports_the_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = write_frames(dir.path(), &[10]);
        let broken = dir.path().join("2.png");
        std::fs::write(&broken, b"garbage").unwrap();
        files.push(broken);

        let queue = Arc::new(FrameQueue::new(8));
        let handle = spawn_producer(files, GridSize::new(2, 2), Arc::clone(&queue)).unwrap();

        assert!(queue.take(Some(Duration::from_secs(5))).is_ok());
        assert!(queue.take(Some(Duration::from_secs(5))).is_err());
        let err = join_producer(handle).unwrap_err();
        assert!(matches!(err, PlayError::Decode { index: 1, .. }));
    }

    #[test]
    fn closing_the_queue_cancels_a_blocked_producer() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_frames(dir.path(), &[0, 0, 0, 0]);
        let queue = Arc::new(FrameQueue::new(1));

        let handle = spawn_producer(files, GridSize::new(2, 2), Arc::clone(&queue)).unwrap();
        while queue.depth() == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }
        queue.close();
        assert_eq!(join_producer(handle).unwrap(), 1);
    }
}
