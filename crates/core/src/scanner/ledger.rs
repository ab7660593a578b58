//! Size bookkeeping during a scan and the final conversion into a task tree.

use log::debug;

use crate::catalog::{ModuleCatalog, ModuleId};
use crate::model::{MemoryUsage, Module, Task, COMMON_TASK, STANDARD_LIBRARY};
use crate::scanner::state::{Target, TaskId};

/// A task while the scan is still running: it references catalog modules by id.
#[derive(Debug, Clone)]
pub(crate) struct TaskSlot {
    pub name: String,
    pub members: Vec<ModuleId>,
    pub exram: u64,
    pub stack: u64,
}

impl TaskSlot {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: Vec::new(), exram: 0, stack: 0 }
    }
}

/// Mutable scan results: the catalog modules, the placeholder module and the tasks.
#[derive(Debug, Clone)]
pub(crate) struct Ledger {
    pub catalog: ModuleCatalog,
    pub placeholder: Module,
    pub tasks: Vec<TaskSlot>,
}

impl Ledger {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            catalog,
            placeholder: Module::new(STANDARD_LIBRARY),
            tasks: vec![TaskSlot::new(COMMON_TASK)],
        }
    }

    pub fn find_or_create_task(&mut self, name: &str) -> TaskId {
        if let Some(idx) = self.tasks.iter().position(|t| t.name == name) {
            return TaskId(idx);
        }
        debug!("new task {name}");
        self.tasks.push(TaskSlot::new(name));
        TaskId(self.tasks.len() - 1)
    }

    pub fn task_mut(&mut self, id: TaskId) -> &mut TaskSlot {
        &mut self.tasks[id.0]
    }

    pub fn module_mut(&mut self, target: Target) -> &mut Module {
        match target {
            Target::Placeholder => &mut self.placeholder,
            Target::Catalog(id) => self.catalog.get_mut(id),
        }
    }

    /// Resolve `library` to a module, letting a named task claim it.
    ///
    /// A module is claimed at most once; later tasks referencing an already
    /// claimed module attribute to it without taking it over.
    pub fn resolve(&mut self, library: &str, task: Option<TaskId>) -> Option<ModuleId> {
        let id = self.catalog.lookup(library)?;
        if let Some(task) = task.filter(|t| *t != TaskId::COMMON) {
            if !self.catalog.get(id).is_claimed() {
                let slot = &mut self.tasks[task.0];
                slot.members.push(id);
                let name = slot.name.clone();
                debug!("task {} claims module {}", name, self.catalog.get(id).name);
                self.catalog.get_mut(id).task_name = name;
            }
        }
        Some(id)
    }

    /// Like [`Ledger::resolve`] but unresolved libraries land in the placeholder.
    pub fn resolve_or_placeholder(&mut self, library: &str, task: Option<TaskId>) -> Target {
        match self.resolve(library, task) {
            Some(id) => Target::Catalog(id),
            None => Target::Placeholder,
        }
    }

    /// Build the final tree.
    ///
    /// Modules without contributions are dropped everywhere, unclaimed modules
    /// join the common task after the placeholder, and tasks left without
    /// modules are removed.
    pub fn finalize(self) -> MemoryUsage {
        let Ledger { catalog, placeholder, tasks: task_slots } = self;
        let mut slots: Vec<Option<Module>> = catalog
            .into_modules()
            .into_iter()
            .map(|m| if m.is_empty() { None } else { Some(m) })
            .collect();

        let mut placeholder = Some(placeholder);
        let mut tasks = Vec::with_capacity(task_slots.len());
        for slot in task_slots {
            let mut task = Task::new(slot.name);
            task.exram = slot.exram;
            task.stack = slot.stack;
            if task.is_common() {
                task.modules.extend(placeholder.take());
            }
            task.modules.extend(slot.members.iter().filter_map(|id| slots[id.0].take()));
            tasks.push(task);
        }

        let unclaimed: Vec<Module> = slots
            .iter_mut()
            .filter(|s| s.as_ref().is_some_and(|m| !m.is_claimed()))
            .filter_map(Option::take)
            .collect();
        if let Some(common) = tasks.iter_mut().find(|t| t.is_common()) {
            common.modules.extend(unclaimed);
        }

        let mut usage = MemoryUsage::new(tasks);
        usage.prune();
        usage
    }
}
