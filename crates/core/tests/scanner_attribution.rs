use memusage_core::catalog::ModuleCatalog;
use memusage_core::demangle::{Demangler, RawNames};
use memusage_core::model::{Module, COMMON_TASK, STANDARD_LIBRARY};
use memusage_core::scanner::{scan_map_str, MapScanner};

/// Demangler that makes it visible which names went through it.
struct Tagging;

impl Demangler for Tagging {
    fn demangle(&self, raw: &str) -> String {
        format!("<{raw}>")
    }

    fn name(&self) -> &'static str {
        "tagging"
    }
}

fn map(body: &str) -> String {
    format!(
        "Archive member included to satisfy reference by file (symbol)\n\n\
         Memory Configuration\n\n\
         Linker script and memory map\n\n{body}\n/DISCARD/\n *(.ARM.exidx*)\n"
    )
}

fn catalog(entries: &[(&str, &[&str])]) -> ModuleCatalog {
    ModuleCatalog::new(
        entries
            .iter()
            .map(|(name, libs)| Module::new(*name).with_libraries(libs.iter().copied()))
            .collect(),
    )
}

#[test]
fn ram_contribution_lands_in_the_claiming_task() {
    let text = map(".task_section_worker_ram\n0x0000000000001000 0x00000020 libworker.a\n");
    let usage = scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames)
        .expect("scan");

    let worker = usage.task("worker").expect("worker task");
    assert_eq!(worker.modules.len(), 1);
    assert_eq!(worker.modules[0].name, "Worker");
    assert_eq!(worker.modules[0].ram_size, 32);
    assert_eq!(worker.modules[0].task_name, "worker");
    assert_eq!(worker.stack, 0);
    assert_eq!(worker.total_ram(), 32);

    let names: Vec<&str> = usage.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![COMMON_TASK, "worker"]);
}

#[test]
fn text_contribution_is_attributed_by_library_name() {
    let text = map(
        " .text._ZN4Beta4stepEv\n                0x0000000008001000       0x10 /build/src/beta/libB.a(beta.cpp.obj)\n",
    );
    let usage = scan_map_str(
        &text,
        catalog(&[("A", &["libA.a"]), ("B", &["libB.a"])]),
        &RawNames,
    )
    .expect("scan");

    let (task, b) = usage.module("B").expect("module B");
    assert_eq!(task.name, COMMON_TASK);
    assert_eq!(b.flash_size, 0x10);
    assert_eq!(b.functions.len(), 1);
    assert_eq!(b.functions[0].name, "_ZN4Beta4stepEv");
    assert_eq!(b.functions[0].flash_size, 0x10);
    // A saw nothing and is pruned.
    assert!(usage.module("A").is_none());
}

#[test]
fn symbol_and_size_on_one_line_are_attributed_together() {
    let text = map(" .text.main     0x0000000008000100       0x1c libapp.a(main.cpp.obj)\n");
    let usage =
        scan_map_str(&text, catalog(&[("App", &["libapp.a"])]), &Tagging).expect("scan");

    let (_, app) = usage.module("App").expect("module");
    assert_eq!(app.flash_size, 0x1c);
    assert_eq!(app.functions.len(), 1);
    assert_eq!(app.functions[0].name, "<main>");
    assert_eq!(app.functions[0].flash_size, 0x1c);
}

#[test]
fn section_suffixes_are_stripped_before_demangling() {
    let text = map(
        " .text._ZN3Foo3barEv.part.0\n                0x0000000008000200        0x8 libfoo.a(foo.cpp.obj)\n",
    );
    let usage = scan_map_str(&text, catalog(&[("Foo", &["libfoo.a"])]), &Tagging).expect("scan");
    let (_, foo) = usage.module("Foo").expect("module");
    assert_eq!(foo.functions[0].name, "<_ZN3Foo3barEv>");
}

#[test]
fn unknown_library_falls_back_to_standard_library() {
    let text = map(
        " .text.memcpy\n                0x0000000008002000       0x40 /opt/gcc/arm-none-eabi/lib/libc.a(memcpy.o)\n\
          .rodata.table\n                0x0000000008003000       0x24 libm.a(table.o)\n",
    );
    let usage = scan_map_str(&text, catalog(&[("App", &["libapp.a"])]), &RawNames).expect("scan");

    let common = usage.common_task().expect("common task");
    let std_lib = common.module(STANDARD_LIBRARY).expect("placeholder");
    assert_eq!(std_lib.flash_size, 0x40 + 0x24);
    assert_eq!(usage.used().flash, 0x40 + 0x24);
    assert_eq!(std_lib.functions.len(), 2);
}

#[test]
fn ram_with_unknown_library_is_kept_in_standard_library() {
    let text = map(
        ".task_section_worker_ram\n .bss.errno     0x0000000020000000        0x4 libc.a(errno.o)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");
    let std_lib = usage.common_task().and_then(|t| t.module(STANDARD_LIBRARY)).expect("std");
    assert_eq!(std_lib.ram_size, 4);
    assert_eq!(std_lib.functions[0].name, "errno");
    assert_eq!(std_lib.functions[0].ram_size, 4);
    // Nothing claimed by the worker task, so it is dropped.
    assert!(usage.task("worker").is_none());
}

#[test]
fn stack_goes_to_the_task_and_the_block_continues_as_ram() {
    let text = map(
        ".task_section_worker_stack\n\
         \x20               0x0000000020003000      0x400 libworker.a(worker.cpp.obj)\n\
         \x20               0x0000000020003400       0x10 libworker.a(worker.cpp.obj)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");

    let worker = usage.task("worker").expect("worker");
    assert_eq!(worker.stack, 0x400);
    assert_eq!(worker.modules[0].ram_size, 0x10);
    assert_eq!(worker.total_ram(), 0x410);
}

#[test]
fn exram_goes_to_the_task() {
    let text = map(
        ".task_section_worker_exram\n                0x0000000060000000     0x1000 libworker.a(worker.cpp.obj)\n\
         .task_section_worker_ram\n                0x0000000020000000       0x20 libworker.a(worker.cpp.obj)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");
    let worker = usage.task("worker").expect("worker");
    assert_eq!(worker.exram, 0x1000);
    assert_eq!(usage.used().exram, 0x1000);
    // exram is not part of module RAM.
    assert_eq!(worker.total_ram(), 0x20);
}

#[test]
fn named_task_flash_claims_the_module() {
    let text = map(
        ".task_section_net_flash\n .data.table    0x0000000008004000       0x80 libnet.a(net.cpp.obj)\n",
    );
    let usage = scan_map_str(&text, catalog(&[("Net", &["libnet.a"])]), &RawNames).expect("scan");
    let net = usage.task("net").expect("net task");
    assert_eq!(net.total_flash(), 0x80);
    assert_eq!(net.modules[0].functions[0].name, "table");
    assert_eq!(net.modules[0].functions[0].flash_size, 0x80);
}

#[test]
fn region_headers_detach_from_the_current_task() {
    // `.text.*` inside a task block is attributed through the module only.
    let text = map(
        ".task_section_net_flash\n .text._ZN3Net4pollEv\n                0x0000000008004000       0x80 libnet.a(net.cpp.obj)\n",
    );
    let usage = scan_map_str(&text, catalog(&[("Net", &["libnet.a"])]), &RawNames).expect("scan");
    assert!(usage.task("net").is_none());
    let (task, net) = usage.module("Net").expect("module");
    assert_eq!(task.name, COMMON_TASK);
    assert_eq!(net.flash_size, 0x80);
}

#[test]
fn a_module_is_claimed_only_once() {
    let text = map(
        ".task_section_alpha_ram\n                0x0000000020000000       0x10 libshared.a(s.o)\n\
         .task_section_beta_ram\n                0x0000000020000010       0x08 libshared.a(s.o)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Shared", &["libshared.a"])]), &RawNames).expect("scan");

    let alpha = usage.task("alpha").expect("alpha");
    assert_eq!(alpha.modules[0].name, "Shared");
    assert_eq!(alpha.modules[0].ram_size, 0x18);
    assert_eq!(alpha.modules[0].task_name, "alpha");
    assert!(usage.task("beta").is_none(), "beta owns no module and is dropped");
}

#[test]
fn privileged_sections_attribute_straight_to_modules() {
    let text = map(
        ".privileged_functions\n                0x0000000008000000      0x200 libkernel.a(tasks.c.obj)\n\
         .privileged_ram\n                0x0000000020000000       0x80 libkernel.a(tasks.c.obj)\n\
         \x20               0x0000000020000080       0x20 libunknown.a(x.o)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Kernel", &["libkernel.a"])]), &RawNames).expect("scan");

    let (task, kernel) = usage.module("Kernel").expect("kernel");
    assert_eq!(task.name, COMMON_TASK);
    assert_eq!(kernel.flash_size, 0x200);
    assert_eq!(kernel.ram_size, 0x80);
    assert!(kernel.functions.is_empty());
    let std_lib = usage.common_task().and_then(|t| t.module(STANDARD_LIBRARY)).expect("std");
    assert_eq!(std_lib.ram_size, 0x20);
}

#[test]
fn common_flash_header_drops_a_pending_symbol() {
    let text = map(
        " .text._ZN3App4initEv\n.task_section_common_flash\n                0x0000000008000000       0x30 libapp.a(app.o)\n",
    );
    let usage = scan_map_str(&text, catalog(&[("App", &["libapp.a"])]), &RawNames).expect("scan");
    let (_, app) = usage.module("App").expect("app");
    assert_eq!(app.flash_size, 0x30);
    assert!(app.functions.is_empty());
}

#[test]
fn lines_before_the_memory_map_are_ignored() {
    let text = "Memory Configuration\n\
                .task_section_early_ram\n\
                \x20               0x0000000020000000       0x20 libworker.a(w.o)\n\
                Linker script and memory map\n\
                /DISCARD/\n";
    let usage =
        scan_map_str(text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");
    assert!(usage.task("early").is_none());
    assert_eq!(usage.used().ram, 0);
}

#[test]
fn lines_after_discard_are_not_attributed() {
    let text = map(".task_section_worker_ram\n0x0000000000001000 0x00000020 libworker.a\n")
        + ".task_section_worker_ram\n0x0000000000002000 0x00000020 libworker.a\n";
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");
    assert_eq!(usage.task("worker").expect("worker").total_ram(), 32);
}

#[test]
fn unrecognized_lines_are_inert() {
    let text = map(
        ".task_section_worker_ram\n *(.bss .bss.*)\n *fill*         0x0000000020000004        0x4 \n\
         \x20               0x0000000000001000 0x00000020 libworker.a\n LOAD libfoo.a\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");
    assert_eq!(usage.used().ram, 32);
}

#[test]
fn totals_are_conserved_across_tasks_modules_and_functions() {
    let text = map(
        ".task_section_worker_ram\n .bss.counter   0x0000000020000000        0x4 libworker.a(w.o)\n\
         \x20               0x0000000020000004       0x1c libworker.a(w.o)\n\
         .task_section_worker_stack\n                0x0000000020001000      0x200 libworker.a(w.o)\n\
         \x20.text._ZN6Worker3runEv\n                0x0000000008000000       0x40 libworker.a(w.o)\n\
         \x20.text.helper   0x0000000008000040       0x10 libutil.a(u.o)\n\
         \x20.rodata.str1.4\n                0x0000000008000050       0x08 libc.a(s.o)\n",
    );
    let usage = scan_map_str(
        &text,
        catalog(&[("Worker", &["libworker.a"]), ("Util", &["libutil.a"])]),
        &RawNames,
    )
    .expect("scan");

    for task in &usage.tasks {
        let flash: u64 = task.modules.iter().map(|m| m.flash_size).sum();
        assert_eq!(task.total_flash(), flash);
        for module in &task.modules {
            let listed: u64 = module.functions.iter().map(|f| f.flash_size).sum();
            assert_eq!(module.flash_size, listed + module.unattributed_flash());
        }
    }
    let used = usage.used();
    assert_eq!(used.flash, 0x40 + 0x10 + 0x08);
    assert_eq!(used.ram, 0x4 + 0x1c + 0x200);

    let worker = usage.task("worker").expect("worker");
    let module = worker.module("Worker").expect("module");
    assert_eq!(module.unattributed_ram(), 0x1c);
    assert_eq!(module.flash_size, 0x40);
}

#[test]
fn block_modes_persist_across_size_lines() {
    let mut scanner = MapScanner::new(catalog(&[("Worker", &["libworker.a"])]), &RawNames);
    scanner.feed("Linker script and memory map");
    scanner.feed(".task_section_worker_ram");
    scanner.feed("                0x0000000020000000       0x10 libworker.a(w.o)");
    assert!(scanner.state().awaiting_attribution());
    scanner.feed("                0x0000000020000010       0x10 libworker.a(w.o)");
    assert!(scanner.state().awaiting_attribution());

    scanner.feed(".privileged_ram");
    scanner.feed("                0x0000000020001000       0x08 libworker.a(w.o)");
    assert!(scanner.state().in_privileged_block());
    scanner.feed("                0x0000000020001008       0x08 libworker.a(w.o)");
    assert!(scanner.state().in_privileged_block());

    scanner.feed("/DISCARD/");
    let usage = scanner.finish().expect("finished");
    let (task, worker) = usage.module("Worker").expect("worker");
    assert_eq!(task.name, "worker");
    assert_eq!(worker.ram_size, 0x30);
}

#[test]
fn a_sizeless_symbol_line_ends_the_stack_part_of_a_block() {
    let text = map(
        ".task_section_worker_stack\n \
         .bss.ucStack   \n\
         \x20               0x0000000020003000       0x40 libworker.a(w.o)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");

    let worker = usage.task("worker").expect("worker");
    assert_eq!(worker.stack, 0);
    let module = worker.module("Worker").expect("module");
    assert_eq!(module.ram_size, 0x40);
    assert_eq!(module.functions[0].name, "ucStack");
    assert_eq!(module.functions[0].ram_size, 0x40);
}

#[test]
fn oversized_lengths_saturate_instead_of_overflowing() {
    let text = map(
        ".task_section_worker_ram\n\
         \x20               0x0000000020000000 0xffffffffffffffff libworker.a(w.o)\n\
         \x20               0x0000000020000000       0x10 libworker.a(w.o)\n",
    );
    let usage =
        scan_map_str(&text, catalog(&[("Worker", &["libworker.a"])]), &RawNames).expect("scan");
    let (_, worker) = usage.module("Worker").expect("worker");
    assert_eq!(worker.ram_size, u64::MAX);
    assert_eq!(usage.used().ram, u64::MAX);
}
