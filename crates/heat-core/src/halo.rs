// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Halo Exchange
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ghost-cell exchange between face neighbours.
//!
//! Each worker sends the outward-facing interior strip of every face that
//! has a neighbour and writes what it receives into the matching ghost
//! strip. All sends are posted before any receive, so a round completes
//! whatever order the workers are scheduled in.

use crate::comm::{Communicator, Tag};
use crate::decomposition::{Decomposition, Direction, Neighbors};
use crate::subdomain::Subdomain;
use heat_types::error::{HeatError, HeatResult};

pub fn pack_edge(sub: &Subdomain, dir: Direction) -> Vec<f64> {
    sub.edge(dir).to_vec()
}

pub fn read_ghost(sub: &Subdomain, dir: Direction) -> Vec<f64> {
    sub.ghost(dir).to_vec()
}

/// Write a received strip into the ghost cells on `dir`. A strip of the
/// wrong length is a `TopologyError`.
pub fn apply_edge(sub: &mut Subdomain, dir: Direction, data: &[f64]) -> HeatResult<()> {
    sub.set_ghost(dir, data)
}

/// One collective exchange round for a single worker. Faces without a
/// neighbour keep their boundary values.
pub fn exchange<C: Communicator + ?Sized>(
    sub: &mut Subdomain,
    neighbors: &Neighbors,
    comm: &C,
    round: usize,
) -> HeatResult<()> {
    for (dir, peer) in neighbors.iter() {
        comm.send(peer, Tag::Halo { round, face: dir }, pack_edge(sub, dir))?;
    }
    for (dir, peer) in neighbors.iter() {
        let tag = Tag::Halo {
            round,
            face: dir.opposite(),
        };
        let data = comm.recv(peer, tag)?;
        apply_edge(sub, dir, &data)?;
    }
    Ok(())
}

/// Serial exchange across every subdomain held in one address space.
/// Strips are collected first and applied afterwards, so the result is
/// the same as the message-passing version.
pub fn serial_halo_exchange(subs: &mut [Subdomain], decomposition: &Decomposition) -> HeatResult<()> {
    if subs.len() != decomposition.len() {
        return Err(HeatError::TopologyError(format!(
            "subdomains/placements length mismatch: {} vs {}",
            subs.len(),
            decomposition.len()
        )));
    }

    // Each entry: (dest rank, face at dest, data).
    let mut messages: Vec<(usize, Direction, Vec<f64>)> = Vec::new();
    for (i, sub) in subs.iter().enumerate() {
        if sub.rank() != i {
            return Err(HeatError::TopologyError(format!(
                "Subdomain at index {i} belongs to rank {}",
                sub.rank()
            )));
        }
        for (dir, peer) in decomposition.neighbors(i)?.iter() {
            messages.push((peer, dir.opposite(), pack_edge(sub, dir)));
        }
    }

    for (dest, face, data) in messages {
        apply_edge(&mut subs[dest], face, &data)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::channel_world;
    use crate::decomposition::decompose;
    use crate::gather::GlobalGrid;
    use ndarray::Array2;
    use std::thread;

    /// Framed global grid with a distinct value in every cell.
    fn sample_global(width: usize, height: usize) -> GlobalGrid {
        let cells = Array2::from_shape_fn((height + 2, width + 2), |(i, j)| {
            (i as f64) * 1000.0 + j as f64
        });
        GlobalGrid::from_cells(width, height, cells).expect("framed grid")
    }

    /// Scatter, then blank every ghost that has a neighbour behind it.
    fn scattered_with_blank_halos(global: &GlobalGrid, d: &Decomposition) -> Vec<Subdomain> {
        d.placements()
            .iter()
            .map(|p| {
                let mut sub = Subdomain::from_cells(*p, global.extract(p)).expect("scatter");
                for (dir, _) in d.neighbors(p.rank).unwrap().iter() {
                    let zeros = vec![0.0; p.edge_len(dir)];
                    apply_edge(&mut sub, dir, &zeros).unwrap();
                }
                sub
            })
            .collect()
    }

    fn assert_ghosts_match_global(subs: &[Subdomain], global: &GlobalGrid) {
        for sub in subs {
            let p = sub.placement();
            let (rows, cols) = p.padded_shape();
            for row in 0..rows {
                for col in 0..cols {
                    let expect = global.cells()[[p.y0 + row, p.x0 + col]];
                    let got = sub.cells()[[row, col]];
                    // Corner ghosts are never exchanged.
                    let corner = (row == 0 || row == rows - 1) && (col == 0 || col == cols - 1);
                    if !corner {
                        assert_eq!(
                            expect, got,
                            "Rank {} at local ({row},{col}): expected {expect}, got {got}",
                            p.rank
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_pack_edge_orientation() {
        let global = sample_global(4, 3);
        let d = decompose(4, 3, 1).unwrap();
        let p = *d.placement(0).unwrap();
        let sub = Subdomain::from_cells(p, global.extract(&p)).unwrap();
        assert_eq!(pack_edge(&sub, Direction::North), vec![1001.0, 1002.0, 1003.0, 1004.0]);
        assert_eq!(pack_edge(&sub, Direction::South), vec![3001.0, 3002.0, 3003.0, 3004.0]);
        assert_eq!(pack_edge(&sub, Direction::West), vec![1001.0, 2001.0, 3001.0]);
        assert_eq!(pack_edge(&sub, Direction::East), vec![1004.0, 2004.0, 3004.0]);
        assert_eq!(read_ghost(&sub, Direction::North), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(read_ghost(&sub, Direction::East), vec![1005.0, 2005.0, 3005.0]);
    }

    #[test]
    fn test_apply_edge_length_guard() {
        let d = decompose(6, 4, 1).unwrap();
        let mut sub = Subdomain::new(*d.placement(0).unwrap(), 0.0);
        let err = apply_edge(&mut sub, Direction::West, &[1.0; 6]).expect_err("mismatch");
        match err {
            HeatError::TopologyError(msg) => assert!(msg.contains("length mismatch")),
            other => panic!("Unexpected error: {other:?}"),
        }
        apply_edge(&mut sub, Direction::West, &[1.0; 4]).expect("matching length");
        assert_eq!(read_ghost(&sub, Direction::West), vec![1.0; 4]);
    }

    #[test]
    fn test_serial_halo_exchange_correctness() {
        let global = sample_global(12, 9);
        let d = decompose(12, 9, 6).expect("decompose");
        let mut subs = scattered_with_blank_halos(&global, &d);
        serial_halo_exchange(&mut subs, &d).expect("halo exchange");
        assert_ghosts_match_global(&subs, &global);
    }

    #[test]
    fn test_threaded_exchange_matches_global() {
        let global = sample_global(16, 16);
        let d = decompose(16, 16, 4).expect("2x2");
        let subs = scattered_with_blank_halos(&global, &d);
        let world = channel_world(d.len());
        let exchanged: Vec<Subdomain> = thread::scope(|scope| {
            let handles: Vec<_> = subs
                .into_iter()
                .zip(world)
                .map(|(mut sub, comm)| {
                    let d = &d;
                    scope.spawn(move || {
                        let nb = *d.neighbors(sub.rank()).unwrap();
                        exchange(&mut sub, &nb, &comm, 1).expect("exchange");
                        sub
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_ghosts_match_global(&exchanged, &global);
    }

    #[test]
    fn test_no_neighbor_ghost_untouched() {
        let global = sample_global(8, 8);
        let d = decompose(8, 8, 2).expect("split");
        let mut subs = scattered_with_blank_halos(&global, &d);
        let open_faces = |sub: &Subdomain| -> Vec<(Direction, Vec<f64>)> {
            let nb = d.neighbors(sub.rank()).unwrap();
            Direction::ALL
                .into_iter()
                .filter(|&dir| nb.get(dir).is_none())
                .map(|dir| (dir, read_ghost(sub, dir)))
                .collect()
        };
        let before: Vec<_> = subs.iter().map(open_faces).collect();
        serial_halo_exchange(&mut subs, &d).unwrap();
        for (sub, faces) in subs.iter().zip(before) {
            assert_eq!(faces.len(), 3);
            for (dir, ghost) in faces {
                assert_eq!(read_ghost(sub, dir), ghost, "{dir:?} ghost changed");
            }
        }
    }

    #[test]
    fn test_serial_exchange_rejects_misordered_subdomains() {
        let d = decompose(8, 8, 2).unwrap();
        let mut subs: Vec<Subdomain> = d
            .placements()
            .iter()
            .rev()
            .map(|p| Subdomain::new(*p, 0.0))
            .collect();
        assert!(serial_halo_exchange(&mut subs, &d).is_err());
        assert!(serial_halo_exchange(&mut subs[..1], &d).is_err());
    }
}
