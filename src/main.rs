fn main() {
    meshpulse::run()
}
