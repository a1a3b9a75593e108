use crate::{
    device::Bus,
    isa::mips::{
        context::{CONTEXT_SIZE, ContextError},
        executor::MipsCPU,
    },
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no core #{idx}, the scheduler holds {cpu_cnt}")]
    NoSuchCore { idx: usize, cpu_cnt: usize },
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Time-slices several cores over one bus.
///
/// Only one core is resident at a time; the others are parked as context blobs and
/// swapped in with `set_context` when their turn comes.
pub struct Scheduler<B: Bus> {
    cpu: MipsCPU<B>,
    contexts: Vec<[u8; CONTEXT_SIZE]>,
    cycles: Vec<u64>,
    active: usize,
    slice: i64,
}

impl<B: Bus> Scheduler<B> {
    /// `cpu_cnt` cores, all fresh out of reset, each running `slice` cycles per turn.
    pub fn new(bus: B, cpu_cnt: usize, slice: i64) -> Self {
        assert!(cpu_cnt > 0, "a scheduler needs at least one core");

        let cpu = MipsCPU::new(bus);
        let reset_state = cpu.snapshot();
        Self {
            cpu,
            contexts: vec![reset_state; cpu_cnt],
            cycles: vec![0; cpu_cnt],
            active: 0,
            slice,
        }
    }

    pub fn cpu_cnt(&self) -> usize {
        self.contexts.len()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Cycles consumed so far by core `idx`.
    pub fn cycles(&self, idx: usize) -> Option<u64> {
        self.cycles.get(idx).copied()
    }

    pub fn bus(&self) -> &B {
        self.cpu.bus()
    }

    pub fn bus_mut(&mut self) -> &mut B {
        self.cpu.bus_mut()
    }

    /// Make core `idx` resident.
    pub fn switch_to(&mut self, idx: usize) -> Result<(), SchedulerError> {
        if idx >= self.cpu_cnt() {
            return Err(SchedulerError::NoSuchCore {
                idx,
                cpu_cnt: self.cpu_cnt(),
            });
        }
        if idx == self.active {
            return Ok(());
        }

        self.cpu
            .get_context(Some(self.contexts[self.active].as_mut_slice()))?;
        self.cpu.set_context(&self.contexts[idx])?;
        log::trace!("switched from core {} to core {}", self.active, idx);
        self.active = idx;
        Ok(())
    }

    /// Swap core `idx` in and hand it out, e.g. to load registers before a run.
    pub fn cpu_mut(&mut self, idx: usize) -> Result<&mut MipsCPU<B>, SchedulerError> {
        self.switch_to(idx)?;
        Ok(&mut self.cpu)
    }

    /// Run the resident core for one slice, then rotate to the next one.
    pub fn run_slice(&mut self) -> Result<i64, SchedulerError> {
        let consumed = self.cpu.execute(self.slice);
        self.cycles[self.active] += consumed as u64;

        let next = (self.active + 1) % self.cpu_cnt();
        self.switch_to(next)?;
        Ok(consumed)
    }

    /// Give every core `rounds` slices. Returns the total number of cycles consumed.
    pub fn run_rounds(&mut self, rounds: usize) -> Result<i64, SchedulerError> {
        let mut total = 0;
        for _ in 0..rounds * self.cpu_cnt() {
            total += self.run_slice()?;
        }
        Ok(total)
    }

    pub fn into_bus(self) -> B {
        self.cpu.into_bus()
    }
}
