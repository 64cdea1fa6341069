use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// 骰子来源。引擎只通过这个接口取点数，方便测试时注入固定序列。
pub trait Die: Send {
    /// 返回 1..=6 之间的点数
    fn roll(&mut self) -> u8;
}

/// 均匀分布的六面骰
#[derive(Debug, Clone)]
pub struct RandomDie {
    rng: StdRng,
}

impl RandomDie {
    pub fn new() -> Self {
        RandomDie { rng: StdRng::from_os_rng() }
    }

    /// 固定种子，便于复现一局游戏
    pub fn seeded(seed: u64) -> Self {
        RandomDie { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomDie {
    fn default() -> Self {
        Self::new()
    }
}

impl Die for RandomDie {
    fn roll(&mut self) -> u8 {
        self.rng.random_range(1..=6)
    }
}

/// 按预设顺序出点的骰子。序列用完后循环使用。
#[derive(Debug, Clone)]
pub struct LoadedDie {
    faces: VecDeque<u8>,
}

impl LoadedDie {
    /// # Panics
    /// 序列为空或包含 1..=6 以外的点数时 panic
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        let faces: VecDeque<u8> = faces.into_iter().collect();
        assert!(!faces.is_empty(), "LoadedDie 至少需要一个点数");
        assert!(faces.iter().all(|f| (1..=6).contains(f)), "点数必须在 1..=6 之间");
        LoadedDie { faces }
    }
}

impl Die for LoadedDie {
    fn roll(&mut self) -> u8 {
        let face = self.faces.pop_front().unwrap_or(1);
        self.faces.push_back(face);
        face
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_die_in_range() {
        let mut die = RandomDie::seeded(7);
        let mut seen = [false; 7];
        for _ in 0..600 {
            let v = die.roll();
            assert!((1..=6).contains(&v));
            seen[v as usize] = true;
        }
        // 600 次里每个点数都应该出现过
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn test_seeded_die_is_reproducible() {
        let mut a = RandomDie::seeded(42);
        let mut b = RandomDie::seeded(42);
        let xs: Vec<u8> = (0..20).map(|_| a.roll()).collect();
        let ys: Vec<u8> = (0..20).map(|_| b.roll()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_loaded_die_cycles() {
        let mut die = LoadedDie::new([3, 1]);
        assert_eq!(die.roll(), 3);
        assert_eq!(die.roll(), 1);
        assert_eq!(die.roll(), 3);
    }
}
