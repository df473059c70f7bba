//! Worker loop: take a block, extract it unit by unit, load the units.

use std::time::Duration;

use crate::clock;
use crate::log_event;
use crate::mine::Mine;
use crate::types::{Block, Role, WorkerId};

/// Totals for one worker, reported after it finishes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub units_mined: u64,
    pub blocks_mined: u64,
    pub extraction_time: Duration,
}

#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    carried: u64,
    report: WorkerReport,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            carried: 0,
            report: WorkerReport {
                id,
                ..WorkerReport::default()
            },
        }
    }

    /// Work until the queue is exhausted.
    pub fn run(mut self, mine: &Mine) -> WorkerReport {
        while let Some(block) = mine.queue().pop() {
            let spent = self.extract(block, mine);
            log_event!(
                mine.log(),
                Role::Worker,
                Some(self.id),
                "Finished mining a block of resources.;duration={}",
                spent.as_millis()
            );
            self.load_carried(mine);
        }
        tracing::debug!(worker = self.id, units = self.report.units_mined, "queue exhausted");
        self.report
    }

    fn extract(&mut self, block: Block, mine: &Mine) -> Duration {
        let max_ms = mine.config().worker_max_ms;
        let mut spent = Duration::ZERO;
        for _ in 0..block.units() {
            let delay = clock::simulate_random(max_ms);
            self.carried += 1;
            self.report.units_mined += 1;
            spent += delay;
            log_event!(
                mine.log(),
                Role::Worker,
                Some(self.id),
                "Finished mining a resource.;duration={}",
                delay.as_millis()
            );
        }
        self.report.blocks_mined += 1;
        self.report.extraction_time += spent;
        spent
    }

    fn load_carried(&mut self, mine: &Mine) {
        while self.carried > 0 {
            mine.load_unit();
            self.carried -= 1;
        }
    }
}
