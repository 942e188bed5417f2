use std::ops::RangeInclusive;

use crate::error::RegistrationError;

/// A component that can own addresses on a bus.
pub trait Device: Copy + Eq + std::fmt::Debug {
    fn name(self) -> &'static str;
}

/// Which half of an access a claim covers. `$4016`/`$4017` are owned by
/// different devices for reads and writes, so claims are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    fn reads(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    fn writes(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// Address decode table: per-address read/write owners plus a mirror table
/// that is resolved transitively once wiring is complete.
///
/// Lookups after [`AddressMap::seal`] are two array indexes, so the map can
/// sit on the hot path of every CPU and PPU access.
#[derive(Debug, Clone)]
pub struct AddressMap<D: Device> {
    readers: Box<[Option<D>]>,
    writers: Box<[Option<D>]>,
    mirrors: Box<[Option<u16>]>,
    resolved: Box<[u16]>,
    sealed: bool,
}

impl<D: Device> AddressMap<D> {
    /// Creates an empty map spanning `len` addresses.
    pub fn new(len: usize) -> Self {
        Self {
            readers: vec![None; len].into_boxed_slice(),
            writers: vec![None; len].into_boxed_slice(),
            mirrors: vec![None; len].into_boxed_slice(),
            resolved: (0..len).map(|addr| addr as u16).collect(),
            sealed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    fn check_range(&self, range: &RangeInclusive<u16>) -> Result<(), RegistrationError> {
        let end = *range.end() as usize;
        if end >= self.len() {
            return Err(RegistrationError::OutOfRange { addr: end as u32 });
        }
        Ok(())
    }

    /// Hands every address in `range` to `device`. Fails without modifying
    /// the map if any address in the range already has an owner for the
    /// requested access.
    pub fn claim(
        &mut self,
        range: RangeInclusive<u16>,
        access: Access,
        device: D,
    ) -> Result<(), RegistrationError> {
        self.check_range(&range)?;
        for addr in range.clone() {
            let idx = addr as usize;
            let read_owner = self.readers[idx].filter(|_| access.reads());
            let write_owner = self.writers[idx].filter(|_| access.writes());
            if let Some(owner) = read_owner.or(write_owner) {
                return Err(RegistrationError::AlreadyClaimed {
                    addr,
                    owner: owner.name(),
                });
            }
        }
        for addr in range {
            let idx = addr as usize;
            if access.reads() {
                self.readers[idx] = Some(device);
            }
            if access.writes() {
                self.writers[idx] = Some(device);
            }
        }
        self.sealed = false;
        Ok(())
    }

    /// Folds every address in `range` onto `target(addr)`. A mirrored
    /// address may itself point at another mirror; chains are followed when
    /// the map is sealed.
    pub fn mirror(
        &mut self,
        range: RangeInclusive<u16>,
        target: impl Fn(u16) -> u16,
    ) -> Result<(), RegistrationError> {
        self.check_range(&range)?;
        for addr in range.clone() {
            if self.mirrors[addr as usize].is_some() {
                return Err(RegistrationError::AlreadyClaimed {
                    addr,
                    owner: "mirror",
                });
            }
        }
        for addr in range {
            let to = target(addr);
            if to as usize >= self.len() {
                return Err(RegistrationError::OutOfRange { addr: to as u32 });
            }
            self.mirrors[addr as usize] = Some(to);
        }
        self.sealed = false;
        Ok(())
    }

    /// Resolves every mirror chain down to its canonical address.
    pub fn seal(&mut self) -> Result<(), RegistrationError> {
        let len = self.len();
        let mut state = vec![Visit::Pending; len];
        let mut chain = Vec::new();

        for start in 0..len {
            if state[start] == Visit::Done {
                continue;
            }
            chain.clear();
            let mut cursor = start;
            let canonical = loop {
                match state[cursor] {
                    Visit::Done => break self.resolved[cursor],
                    Visit::InProgress => {
                        return Err(RegistrationError::MirrorCycle {
                            addr: cursor as u16,
                        });
                    }
                    Visit::Pending => {}
                }
                state[cursor] = Visit::InProgress;
                chain.push(cursor);
                match self.mirrors[cursor] {
                    Some(next) => cursor = next as usize,
                    None => break cursor as u16,
                }
            };
            for &addr in &chain {
                self.resolved[addr] = canonical;
                state[addr] = Visit::Done;
            }
        }

        self.sealed = true;
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Canonical address after all mirrors are applied.
    #[inline]
    pub fn resolve(&self, addr: u16) -> u16 {
        self.resolved[addr as usize % self.resolved.len()]
    }

    /// Owner of reads at an already-resolved address.
    #[inline]
    pub fn reader(&self, canonical: u16) -> Option<D> {
        self.readers[canonical as usize]
    }

    /// Owner of writes at an already-resolved address.
    #[inline]
    pub fn writer(&self, canonical: u16) -> Option<D> {
        self.writers[canonical as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Dev {
        Ram,
        Port,
    }

    impl Device for Dev {
        fn name(self) -> &'static str {
            match self {
                Dev::Ram => "ram",
                Dev::Port => "port",
            }
        }
    }

    #[test]
    fn double_claim_is_rejected() {
        let mut map = AddressMap::new(0x100);
        map.claim(0x00..=0x0F, Access::ReadWrite, Dev::Ram).unwrap();
        let err = map.claim(0x0F..=0x10, Access::Read, Dev::Port).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::AlreadyClaimed {
                addr: 0x0F,
                owner: "ram"
            }
        );
        // Nothing from the failed claim leaked in.
        assert_eq!(map.reader(0x10), None);
    }

    #[test]
    fn split_read_write_claims_coexist() {
        let mut map = AddressMap::new(0x10);
        map.claim(0x04..=0x04, Access::Read, Dev::Port).unwrap();
        map.claim(0x04..=0x04, Access::Write, Dev::Ram).unwrap();
        assert_eq!(map.reader(0x04), Some(Dev::Port));
        assert_eq!(map.writer(0x04), Some(Dev::Ram));
    }

    #[test]
    fn mirrors_resolve_transitively() {
        let mut map = AddressMap::<Dev>::new(0x40);
        map.mirror(0x20..=0x3F, |a| a & 0x1F).unwrap();
        map.mirror(0x10..=0x1F, |a| a - 0x10).unwrap();
        map.seal().unwrap();
        assert_eq!(map.resolve(0x35), 0x05);
        assert_eq!(map.resolve(0x15), 0x05);
        assert_eq!(map.resolve(0x05), 0x05);
    }

    #[test]
    fn mirror_cycle_is_a_configuration_error() {
        let mut map = AddressMap::<Dev>::new(0x10);
        map.mirror(0x01..=0x01, |_| 0x02).unwrap();
        map.mirror(0x02..=0x02, |_| 0x03).unwrap();
        map.mirror(0x03..=0x03, |_| 0x01).unwrap();
        assert!(matches!(
            map.seal(),
            Err(RegistrationError::MirrorCycle { .. })
        ));
    }

    #[test]
    fn out_of_range_claim_fails() {
        let mut map = AddressMap::new(0x10);
        assert_eq!(
            map.claim(0x08..=0x10, Access::Read, Dev::Ram),
            Err(RegistrationError::OutOfRange { addr: 0x10 })
        );
    }
}
