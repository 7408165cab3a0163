use std::io::Write;

use tracing::{info, warn};

use crate::bootstrap::error::{BootstrapError, Result};
use crate::group::{ProcessGroup, RankIdentity};

pub mod error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Joined,
    Reported,
    Left,
}

/// Owns the membership of this process in a group from join to leave. Every group operation goes
/// through the session, which rejects calls made out of order. If the session is dropped while
/// the process is still a member, the group is left on drop.
pub struct GroupSession<G: ProcessGroup> {
    group: Option<G>,
    state: SessionState,
}

impl<G: ProcessGroup> GroupSession<G> {
    pub fn new() -> Self {
        GroupSession {
            group: None,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn group(&self) -> Option<&G> {
        self.group.as_ref()
    }

    /// Establishes the group with `connect`, which receives the startup arguments of the process.
    /// Blocks until the runtime has admitted this process.
    pub fn join<C>(&mut self, args: &[String], connect: C) -> Result<()>
    where
        C: FnOnce(&[String]) -> Result<G>,
    {
        if self.state != SessionState::Uninitialized {
            return Err(BootstrapError::violation("join", self.state));
        }

        let group = connect(args)?;
        self.group = Some(group);
        self.state = SessionState::Joined;
        Ok(())
    }

    pub fn identity(&self) -> Result<RankIdentity> {
        match (self.state, self.group.as_ref()) {
            (SessionState::Joined | SessionState::Reported, Some(group)) => group.identity(),
            _ => Err(BootstrapError::violation("identity", self.state)),
        }
    }

    /// Writes the identification line of this process to `out`.
    pub fn report<W: Write>(&mut self, identity: &RankIdentity, out: &mut W) -> Result<()> {
        if self.state != SessionState::Joined {
            return Err(BootstrapError::violation("report", self.state));
        }

        writeln!(
            out,
            "Hello world from process {} of {}",
            identity.rank(),
            identity.size()
        )?;
        out.flush()?;

        self.state = SessionState::Reported;
        Ok(())
    }

    /// Collective shutdown. Must be the last group operation of the process.
    pub fn leave(&mut self) -> Result<()> {
        match (self.state, self.group.take()) {
            (SessionState::Joined | SessionState::Reported, Some(group)) => {
                group.leave();
                self.state = SessionState::Left;
                Ok(())
            }
            (state, group) => {
                self.group = group;
                Err(BootstrapError::violation("leave", state))
            }
        }
    }
}

impl<G: ProcessGroup> Default for GroupSession<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: ProcessGroup> Drop for GroupSession<G> {
    fn drop(&mut self) {
        if let Some(group) = self.group.take() {
            warn!(
                "Session dropped in state {:?}. Leaving process group.",
                self.state
            );
            group.leave();
            self.state = SessionState::Left;
        }
    }
}

/// Runs join, identity, report and leave in this order. If any step after join fails, the group
/// is still left exactly once before the error is returned.
pub fn run<G, C, W>(args: &[String], connect: C, out: &mut W) -> Result<RankIdentity>
where
    G: ProcessGroup,
    C: FnOnce(&[String]) -> Result<G>,
    W: Write,
{
    run_with(args, connect, move |_| out)
}

/// Same as [`run`], but the report stream is created by `create_out` once this process has
/// joined. A panic in `create_out` unwinds through the session, which leaves the group.
pub fn run_with<G, C, W, F>(args: &[String], connect: C, create_out: F) -> Result<RankIdentity>
where
    G: ProcessGroup,
    C: FnOnce(&[String]) -> Result<G>,
    W: Write,
    F: FnOnce(&RankIdentity) -> W,
{
    let mut session = GroupSession::new();
    session.join(args, connect)?;

    let identity = session.identity()?;
    if let Some(group) = session.group() {
        info!("{identity} running on {}", group.processor_name());
    }

    let mut out = create_out(&identity);
    session.report(&identity, &mut out)?;
    session.leave()?;
    Ok(identity)
}
