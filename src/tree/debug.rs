use std::fmt::Display;

use super::{OctantFlags, Octree};

impl Display for Octree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.settings;
        let (branches, leaves) = self
            .iter()
            .fold((0, 0), |(b, l), o| if o.is_leaf() { (b, l + 1) } else { (b + 1, l) });
        write!(
            f,
            "Octree (center: {:?}, size: {}, depth: {}, ({} branches, {} leaves) / {} links) {{",
            s.center.coords.as_slice(),
            s.size,
            s.max_depth,
            branches,
            leaves,
            super::link_count(&self.connections),
        )?;
        for octant in self.iter() {
            let indent = "  ".repeat(octant.code.depth() as usize + 1);
            let code = octant.code;
            if !octant.is_leaf() {
                write!(f, "\n{indent}<B {code:?}>")?;
                continue;
            }
            let kind = if octant.flags.contains(OctantFlags::INTRANSITABLE) {
                'X'
            } else if octant.flags.contains(OctantFlags::HAS_GROUND) {
                'G'
            } else {
                'L'
            };
            write!(
                f,
                "\n{indent}<{kind} {code:?}> {} neighbors",
                self.neighbors(code).len()
            )?;
        }
        write!(f, "\n}}")
    }
}
