use memusage_core::catalog::ModuleCatalog;
use memusage_core::demangle::RawNames;
use memusage_core::model::{MemoryUsage, Module, Task, COMMON_TASK, STANDARD_LIBRARY};
use memusage_core::scanner::scan_map_str;

fn module(name: &str, ram: u64, flash: u64) -> Module {
    let mut m = Module::new(name);
    m.ram_size = ram;
    m.flash_size = flash;
    m
}

#[test]
fn prune_drops_empty_modules_and_tasks() {
    let mut common = Task::new(COMMON_TASK);
    common.modules.push(Module::new(STANDARD_LIBRARY));
    common.modules.push(module("Idle", 0, 0));
    common.modules.push(module("Hal", 0, 0x100));

    let mut quiet = Task::new("quiet");
    quiet.stack = 0x200;
    quiet.modules.push(module("Unused", 0, 0));

    let mut busy = Task::new("busy");
    busy.modules.push(module("Busy", 0x10, 0));

    let mut usage = MemoryUsage::new(vec![common, quiet, busy]);
    usage.prune();

    let names: Vec<&str> = usage.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![COMMON_TASK, "busy"]);
    let common = usage.common_task().unwrap();
    let modules: Vec<&str> = common.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(modules, vec![STANDARD_LIBRARY, "Hal"]);

    let once = usage.clone();
    usage.prune();
    assert_eq!(usage, once);
}

#[test]
fn common_task_survives_with_only_the_placeholder() {
    let text = "Linker script and memory map\n/DISCARD/\n";
    let usage = scan_map_str(text, ModuleCatalog::default(), &RawNames).unwrap();
    assert_eq!(usage.tasks.len(), 1);
    let common = usage.common_task().unwrap();
    assert_eq!(common.modules.len(), 1);
    assert_eq!(common.modules[0].name, STANDARD_LIBRARY);
    assert!(common.modules[0].is_empty());
}

#[test]
fn every_module_appears_in_exactly_one_task() {
    let catalog = ModuleCatalog::new(vec![
        Module::new("A").with_libraries(["liba.a"]),
        Module::new("B").with_libraries(["libb.a"]),
        Module::new("C").with_libraries(["libc_mod.a"]),
        Module::new("Silent").with_libraries(["libsilent.a"]),
    ]);
    let text = "Linker script and memory map\n\
                .task_section_one_ram\n\
                \x20               0x0000000020000000       0x10 liba.a(a.o)\n\
                .task_section_two_ram\n\
                \x20               0x0000000020000010       0x20 liba.a(a.o)\n\
                \x20               0x0000000020000030       0x20 libb.a(b.o)\n\
                .task_section_common_flash\n\
                \x20               0x0000000008000000      0x100 libc_mod.a(c.o)\n\
                /DISCARD/\n";
    let usage = scan_map_str(text, catalog, &RawNames).unwrap();

    let names: Vec<&str> = usage.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![COMMON_TASK, "one", "two"]);

    for name in ["A", "B", "C"] {
        let owners = usage.tasks.iter().filter(|t| t.module(name).is_some()).count();
        assert_eq!(owners, 1, "{name} should be owned by exactly one task");
    }
    assert!(usage.module("Silent").is_none());

    let (one, a) = usage.module("A").unwrap();
    assert_eq!(one.name, "one");
    assert_eq!(a.ram_size, 0x30);
    assert_eq!(usage.module("B").unwrap().0.name, "two");

    let (common, c) = usage.module("C").unwrap();
    assert!(common.is_common());
    assert_eq!(c.task_name, COMMON_TASK);
    assert_eq!(common.modules[0].name, STANDARD_LIBRARY);
}

#[test]
fn task_that_only_reserves_stack_is_dropped() {
    let catalog = ModuleCatalog::new(vec![Module::new("Idle").with_libraries(["libidle.a"])]);
    let text = "Linker script and memory map\n\
                .task_section_idle_stack\n\
                \x20               0x0000000020000000      0x200 libidle.a(idle.o)\n\
                /DISCARD/\n";
    let usage = scan_map_str(text, catalog, &RawNames).unwrap();
    assert!(usage.task("idle").is_none());
    assert_eq!(usage.used().ram, 0);
}
