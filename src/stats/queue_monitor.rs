use log::warn;
use std::io::{self, Write};

use crate::engine::{PeriodicTask, QueueProbe, SimTime};
use crate::stats::MonitoredQueue;

/// Writes `Time,SrcNode,DstNode,QueuePackets` rows for every monitored
/// direction, flushing after each round.
pub struct QueueSampler<W: Write> {
    queues: Vec<MonitoredQueue>,
    writer: W,
}

impl<W: Write> QueueSampler<W> {
    pub(crate) fn new(queues: Vec<MonitoredQueue>, mut writer: W) -> io::Result<Self> {
        writeln!(writer, "Time,SrcNode,DstNode,QueuePackets")?;
        Ok(Self { queues, writer })
    }

    pub fn sample(&mut self, now: SimTime, probe: &dyn QueueProbe) -> io::Result<()> {
        for queue in &self.queues {
            writeln!(
                self.writer,
                "{},{},{},{}",
                now,
                queue.src_name,
                queue.dst_name,
                probe.queue_depth(queue.device)
            )?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + 'static> QueueSampler<W> {
    /// Periodic task for [`Engine::schedule_periodic`]. Sampling stops at the
    /// first write error.
    ///
    /// [`Engine::schedule_periodic`]: crate::engine::Engine::schedule_periodic
    pub fn into_task(mut self) -> PeriodicTask {
        let mut failed = false;
        Box::new(move |now: SimTime, probe: &dyn QueueProbe| {
            if failed {
                return;
            }
            if let Err(e) = self.sample(now, probe) {
                warn!("Queue monitor write failed at {}s: {}", now, e);
                failed = true;
            }
        })
    }
}
