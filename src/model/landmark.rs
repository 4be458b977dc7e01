use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Point3 = [f64; 3];

pub const N_LANDMARKS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Landmark {
    Mesial,
    Distal,
    Cusp,
    InnerPoint,
    OuterPoint,
    FacialPoint,
}

impl Landmark {
    pub const ALL: [Landmark; N_LANDMARKS] = [
        Landmark::Mesial,
        Landmark::Distal,
        Landmark::Cusp,
        Landmark::InnerPoint,
        Landmark::OuterPoint,
        Landmark::FacialPoint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Landmark::Mesial => "Mesial",
            Landmark::Distal => "Distal",
            Landmark::Cusp => "Cusp",
            Landmark::InnerPoint => "InnerPoint",
            Landmark::OuterPoint => "OuterPoint",
            Landmark::FacialPoint => "FacialPoint",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown landmark class '{0}'")]
pub struct UnknownLandmark(pub String);

impl FromStr for Landmark {
    type Err = UnknownLandmark;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Landmark::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownLandmark(s.to_string()))
    }
}

/// One value per landmark class, indexed by [`Landmark`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassMap<T>([T; N_LANDMARKS]);

impl<T> ClassMap<T> {
    pub fn from_fn(mut f: impl FnMut(Landmark) -> T) -> Self {
        Self(Landmark::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Landmark, &T)> {
        Landmark::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(Landmark, &T) -> U) -> ClassMap<U> {
        ClassMap::from_fn(|l| f(l, &self.0[l.index()]))
    }
}

impl<T> Index<Landmark> for ClassMap<T> {
    type Output = T;

    fn index(&self, landmark: Landmark) -> &T {
        &self.0[landmark.index()]
    }
}

impl<T> IndexMut<Landmark> for ClassMap<T> {
    fn index_mut(&mut self, landmark: Landmark) -> &mut T {
        &mut self.0[landmark.index()]
    }
}

/// A scored prediction, tied to the scan it was made on.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub scan: String,
    pub coord: Point3,
    pub score: f64,
}

pub fn distance(a: &Point3, b: &Point3) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/landmark.rs"]
mod tests;
