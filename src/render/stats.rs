//! Per-frame rendering statistics

use serde::{Deserialize, Serialize};

/// Receives statistics published by render passes
pub trait StatisticsSink {
    fn increase_triangle_count(&mut self, increase: u32);
    fn increase_not_ready_chunk_count(&mut self, increase: u32);
}

/// Triangle and readiness counts for one draining of one queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub chunks_drawn: u32,
    pub triangles: u32,
    pub not_ready: u32,
}

impl PassStats {
    /// Push these counts into a sink
    pub fn publish(&self, sink: &mut dyn StatisticsSink) {
        sink.increase_triangle_count(self.triangles);
        sink.increase_not_ready_chunk_count(self.not_ready);
    }
}

/// Counters accumulated over a frame, reset at the start of each render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStatistics {
    pub triangles: u64,
    pub not_ready_chunks: u64,
    pub chunks_in_proximity: u32,
    pub chunks_culled: u32,
    pub frames: u64,
}

impl RenderStatistics {
    /// Clear per-frame counters
    pub fn reset(&mut self) {
        self.triangles = 0;
        self.not_ready_chunks = 0;
        self.chunks_culled = 0;
    }

    /// Reset and count a new frame
    pub fn begin_frame(&mut self) {
        self.reset();
        self.frames += 1;
    }

    /// Human-readable summary for debug overlays
    pub fn metrics(&self) -> String {
        format!(
            "Chunks in proximity: {}\nChunks culled: {}\nChunks not ready: {}\nTriangles: {}\n",
            self.chunks_in_proximity, self.chunks_culled, self.not_ready_chunks, self.triangles
        )
    }
}

impl StatisticsSink for RenderStatistics {
    fn increase_triangle_count(&mut self, increase: u32) {
        self.triangles += increase as u64;
    }

    fn increase_not_ready_chunk_count(&mut self, increase: u32) {
        self.not_ready_chunks += increase as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_accumulates() {
        let mut stats = RenderStatistics::default();
        PassStats { chunks_drawn: 2, triangles: 300, not_ready: 1 }.publish(&mut stats);
        PassStats { chunks_drawn: 1, triangles: 50, not_ready: 2 }.publish(&mut stats);
        assert_eq!(stats.triangles, 350);
        assert_eq!(stats.not_ready_chunks, 3);
    }

    #[test]
    fn test_begin_frame_resets_counters() {
        let mut stats = RenderStatistics::default();
        stats.increase_triangle_count(10);
        stats.increase_not_ready_chunk_count(4);
        stats.chunks_in_proximity = 9;
        stats.begin_frame();
        assert_eq!(stats.triangles, 0);
        assert_eq!(stats.not_ready_chunks, 0);
        assert_eq!(stats.chunks_in_proximity, 9);
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn test_metrics_text() {
        let stats = RenderStatistics {
            triangles: 12,
            not_ready_chunks: 1,
            chunks_in_proximity: 5,
            chunks_culled: 2,
            frames: 3,
        };
        let text = stats.metrics();
        assert!(text.contains("Triangles: 12"));
        assert!(text.contains("Chunks not ready: 1"));
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = RenderStatistics { triangles: 7, ..Default::default() };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["triangles"], 7);
    }
}
