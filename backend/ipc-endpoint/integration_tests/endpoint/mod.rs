mod forward;
mod reverse;
