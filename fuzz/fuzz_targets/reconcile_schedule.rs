#![no_main]

use dom::{MemoryDom, OutputSnapshot};
use libfuzzer_sys::fuzz_target;
use reconciler::{Reconciler, UnitBudget, WorkLoopStatus};
use vdom::{Element, EventHandler};

const TAGS: [&str; 4] = ["div", "span", "p", "li"];
const MAX_NODES: usize = 256;
const MAX_DEPTH: usize = 6;

struct Bytes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Bytes<'_> {
    fn next(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        byte
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

fn build(bytes: &mut Bytes<'_>, handlers: &[EventHandler], depth: usize, budget: &mut usize) -> Element {
    let op = bytes.next();
    if op % 5 == 0 || depth >= MAX_DEPTH || *budget == 0 {
        return Element::text(i64::from(bytes.next() % 4));
    }
    *budget -= 1;
    let mut element = Element::new(TAGS[usize::from(op) % TAGS.len()]);
    if op & 0x10 != 0 {
        element = element.prop("title", i64::from(bytes.next() % 3));
    }
    if op & 0x20 != 0 {
        element = element.on("click", handlers[usize::from(bytes.next()) % handlers.len()].clone());
    }
    let children = usize::from(bytes.next() % 4);
    for _ in 0..children {
        if bytes.exhausted() || *budget == 0 {
            break;
        }
        element = element.child(build(bytes, handlers, depth + 1, budget));
    }
    element
}

fn render_all(trees: &[Element], slice: Option<usize>) -> Vec<OutputSnapshot> {
    let mut dom = MemoryDom::new();
    let root = dom.create_root().unwrap();
    let mut reconciler = Reconciler::new(dom);
    let mut out = Vec::with_capacity(trees.len());
    for tree in trees {
        reconciler.render(tree.clone(), root);
        loop {
            let status = match slice {
                None => reconciler.flush_sync(),
                Some(units) => reconciler.work_loop(&UnitBudget::new(units)),
            };
            match status {
                Ok(WorkLoopStatus::Committed(_)) => break,
                Ok(WorkLoopStatus::Yielded) => continue,
                Ok(WorkLoopStatus::Idle) => panic!("render vanished"),
                Err(err) => panic!("render failed: {err}"),
            }
        }
        out.push(OutputSnapshot::from_container(reconciler.adapter(), root));
    }
    out
}

fuzz_target!(|data: &[u8]| {
    let Some((&slice, rest)) = data.split_first() else {
        return;
    };
    let handlers = [EventHandler::new(|_| {}), EventHandler::new(|_| {})];
    let mut bytes = Bytes { data: rest, pos: 0 };
    let mut trees = Vec::new();
    while !bytes.exhausted() && trees.len() < 4 {
        let mut budget = MAX_NODES;
        trees.push(build(&mut bytes, &handlers, 0, &mut budget));
    }
    if trees.is_empty() {
        return;
    }

    let expected = render_all(&trees, None);
    for (tree, snapshot) in trees.iter().zip(&expected) {
        assert_eq!(*snapshot, OutputSnapshot::from_element(tree));
    }
    let sliced = render_all(&trees, Some(usize::from(slice % 8) + 1));
    assert_eq!(sliced, expected);
});
