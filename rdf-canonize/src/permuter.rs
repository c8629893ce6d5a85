use std::collections::BTreeMap;

/// Steinhaus–Johnson–Trotter permutation generator over a sorted list.
pub(crate) struct Permuter<T> {
    current: Vec<T>,
    done: bool,
    // true = element is looking left
    dir: BTreeMap<T, bool>,
}

impl<T: Ord + Clone> Permuter<T> {
    pub(crate) fn new(mut list: Vec<T>) -> Self {
        list.sort();
        let dir = list.iter().cloned().map(|element| (element, true)).collect();
        Self {
            current: list,
            done: false,
            dir,
        }
    }
}

impl<T: Ord + Clone> Iterator for Permuter<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        if self.done {
            return None;
        }

        let rval = self.current.clone();
        let length = self.current.len();

        // largest mobile element
        let mut mobile: Option<(usize, T)> = None;
        for i in 0..length {
            let element = &self.current[i];
            let left = self.dir.get(element).copied().unwrap_or(true);
            let is_mobile = (left && i > 0 && *element > self.current[i - 1])
                || (!left && i + 1 < length && *element > self.current[i + 1]);

            if is_mobile && mobile.as_ref().is_none_or(|(_, k)| element > k) {
                mobile = Some((i, element.clone()));
            }
        }

        match mobile {
            None => self.done = true,
            Some((pos, k)) => {
                let left = self.dir.get(&k).copied().unwrap_or(true);
                let swap = if left { pos - 1 } else { pos + 1 };
                self.current.swap(pos, swap);

                for element in &self.current {
                    if *element > k
                        && let Some(direction) = self.dir.get_mut(element)
                    {
                        *direction = !*direction;
                    }
                }
            }
        }

        Some(rval)
    }
}
