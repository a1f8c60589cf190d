// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Worker Communication
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Point-to-point messaging between workers.
//!
//! [`Communicator`] is the seam an rsmpi backend would implement;
//! [`ChannelCommunicator`] is the in-process version built on one
//! `std::sync::mpsc` channel per ordered pair of ranks. Sends never block.
//! Messages between a fixed pair arrive in send order. A worker that exits
//! drops its senders, so anyone waiting on it sees a disconnect instead of
//! hanging.

use crate::decomposition::Direction;
use heat_types::error::{HeatError, HeatResult};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Message label, checked on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Edge strip sent out through `face` of the sender.
    Halo { round: usize, face: Direction },
    /// Local squared residual, worker → root.
    Residual { round: usize },
    /// Agreed global norm, root → worker.
    Norm { round: usize },
    /// Final padded block, worker → collector.
    Gather,
}

#[derive(Debug)]
struct Message {
    tag: Tag,
    payload: Vec<f64>,
}

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Post a message. Must not wait for the matching receive.
    fn send(&self, dest: usize, tag: Tag, payload: Vec<f64>) -> HeatResult<()>;

    /// Block until the next message from `source` arrives and check its tag.
    fn recv(&self, source: usize, tag: Tag) -> HeatResult<Vec<f64>>;
}

/// One rank's end of an in-process channel world.
#[derive(Debug)]
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    outboxes: Vec<Option<Sender<Message>>>,
    inboxes: Vec<Option<Receiver<Message>>>,
}

/// Fully connected set of `size` communicators, index = rank.
pub fn channel_world(size: usize) -> Vec<ChannelCommunicator> {
    let mut outboxes: Vec<Vec<Option<Sender<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    let mut inboxes: Vec<Vec<Option<Receiver<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    for src in 0..size {
        for dst in 0..size {
            if src == dst {
                continue;
            }
            let (tx, rx) = channel();
            outboxes[src][dst] = Some(tx);
            inboxes[dst][src] = Some(rx);
        }
    }
    outboxes
        .into_iter()
        .zip(inboxes)
        .enumerate()
        .map(|(rank, (outboxes, inboxes))| ChannelCommunicator {
            rank,
            size,
            outboxes,
            inboxes,
        })
        .collect()
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<f64>) -> HeatResult<()> {
        let outbox = self
            .outboxes
            .get(dest)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                HeatError::TopologyError(format!(
                    "Rank {} has no channel to rank {dest}",
                    self.rank
                ))
            })?;
        outbox.send(Message { tag, payload }).map_err(|_| {
            HeatError::TopologyError(format!(
                "Rank {dest} unreachable from rank {} while sending {tag:?}",
                self.rank
            ))
        })
    }

    fn recv(&self, source: usize, tag: Tag) -> HeatResult<Vec<f64>> {
        let inbox = self
            .inboxes
            .get(source)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                HeatError::TopologyError(format!(
                    "Rank {} has no channel from rank {source}",
                    self.rank
                ))
            })?;
        let msg = inbox.recv().map_err(|_| {
            HeatError::TopologyError(format!(
                "Rank {source} unreachable from rank {} while waiting for {tag:?}",
                self.rank
            ))
        })?;
        if msg.tag != tag {
            return Err(HeatError::TopologyError(format!(
                "Rank {} expected {tag:?} from rank {source}, got {:?}",
                self.rank, msg.tag
            )));
        }
        Ok(msg.payload)
    }
}
